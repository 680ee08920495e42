use sea_orm::{ActiveModelTrait, EntityTrait, QuerySelect, Set, TransactionTrait, sea_query::LockType};

use crate::{
    audit::{self, AuditAction},
    dto::orders::{OrderList, UpdateOrderStatusRequest},
    entity::orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    order_service::query_orders(state, None, query).await
}

async fn find_order(state: &AppState, id: i64) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let order = find_order(state, id).await?;
    let order = order_service::hydrate_orders(&state.orm, vec![order])
        .await?
        .remove(0);
    Ok(ApiResponse::success("OK", order, None))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;

    let previous = order.status;
    let mut active: OrderActive = order.into();
    active.status = Set(payload.status);
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = order.id,
        from = ?previous,
        to = ?order.status,
        "order status changed"
    );
    audit::record(
        &state.orm,
        Some(user.user_id),
        AuditAction::OrderStatusUpdate,
        serde_json::json!({ "order_id": order.id, "from": previous, "to": order.status }),
    )
    .await;

    let order = order_service::hydrate_orders(&state.orm, vec![order])
        .await?
        .remove(0);
    Ok(ApiResponse::success(
        "Order status updated",
        order,
        Some(Meta::empty()),
    ))
}
