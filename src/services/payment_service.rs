use rust_decimal::{Decimal, prelude::ToPrimitive};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr};

use crate::{
    audit::{self, AuditAction},
    dto::orders::{CreatePaymentIntentRequest, PaymentIntentResponse},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        payments::{Column as PaymentCol, Entity as Payments},
    },
    error::{AppError, AppResult},
    integrations::payments::PaymentIntentRequest,
    middleware::auth::AuthUser,
    models::line_total,
    response::{ApiResponse, Meta},
    services::order_service::find_own_order,
    state::AppState,
};

/// Currency units to minor units (x100), truncating any sub-minor fraction.
pub fn to_minor_units(amount: Decimal) -> AppResult<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i64()
        .ok_or_else(|| AppError::BadRequest(format!("amount {amount} is out of range")))
}

/// Requests a gateway payment intent for one of the caller's orders.
///
/// The order is already committed; a gateway failure leaves it pending.
pub async fn create_payment_intent(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentIntentRequest,
) -> AppResult<ApiResponse<PaymentIntentResponse>> {
    let order_id = payload
        .order_id
        .ok_or_else(|| AppError::BadRequest("Order ID is required".into()))?;
    let order = find_own_order(&state.orm, user.user_id, order_id).await?;

    let lines = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?;
    let total = line_total(lines.iter().map(|l| (l.price_at_purchase, l.quantity)));
    let amount_minor = to_minor_units(total)?;

    let intent = state
        .payments
        .create_payment_intent(PaymentIntentRequest {
            amount_minor,
            currency: state.config.payment_currency.clone(),
            metadata: vec![("order_id".to_string(), order.id.to_string())],
        })
        .await?;

    tracing::info!(
        user_id = user.user_id,
        order_id = order.id,
        amount_minor,
        intent_id = %intent.id,
        "payment intent created"
    );

    // Bookkeeping only: the client already has a usable intent.
    if let Err(err) = Payments::update_many()
        .col_expr(PaymentCol::TransactionId, Expr::value(intent.id.clone()))
        .filter(PaymentCol::OrderId.eq(order.id))
        .exec(&state.orm)
        .await
    {
        tracing::warn!(error = %err, order_id = order.id, "failed to store payment intent id");
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        AuditAction::PaymentIntentCreate,
        serde_json::json!({ "order_id": order.id, "intent_id": intent.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment intent created",
        PaymentIntentResponse {
            client_secret: intent.client_secret,
            order_id: order.id,
        },
        Some(Meta::empty()),
    ))
}
