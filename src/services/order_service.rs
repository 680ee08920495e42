use std::collections::HashMap;

use rust_decimal::Decimal;

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    Order as SortDirection, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

use crate::{
    audit::{self, AuditAction},
    dto::orders::{OrderList, PlaceOrderRequest},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column, Entity as Orders, Model as OrderModel, OrderStatus},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
        products::Entity as Products,
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, Payment, line_total},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{cart_service::requested_quantity, product_service},
    state::AppState,
};

pub const PAYMENT_METHOD_PENDING: &str = "pending";
pub const PAYMENT_STATUS_PENDING: &str = "Pending";

/// Totals must stay below this to fit `NUMERIC(12, 2)`.
pub fn order_total_ceiling() -> Decimal {
    Decimal::from(10_000_000_000_i64)
}

pub fn ensure_storable_total(total: Decimal) -> AppResult<()> {
    if total >= order_total_ceiling() {
        return Err(AppError::BadRequest("Order total is too large".into()));
    }
    Ok(())
}

/// Turns order rows into their full representation: lines with products,
/// the payment and the customer. Totals are recomputed from the lines.
pub async fn hydrate_orders<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<Order>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();

    let lines = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids.clone()))
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?;
    let product_ids = lines.iter().map(|l| l.product_id).collect();
    let products = product_service::hydrate_by_id(conn, product_ids).await?;

    let mut lines_by_order: HashMap<i64, Vec<OrderItemModel>> = HashMap::new();
    for line in lines {
        lines_by_order.entry(line.order_id).or_default().push(line);
    }

    let mut payments: HashMap<i64, Payment> = Payments::find()
        .filter(PaymentCol::OrderId.is_in(order_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.order_id, Payment::from(p)))
        .collect();

    let user_ids: Vec<i64> = orders.iter().map(|o| o.user_id).collect();
    let customers: HashMap<i64, _> = Users::find()
        .filter(UserCol::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    orders
        .into_iter()
        .map(|order| {
            let lines = lines_by_order.remove(&order.id).unwrap_or_default();
            let total_price = line_total(lines.iter().map(|l| (l.price_at_purchase, l.quantity)));

            let order_items = lines
                .into_iter()
                .map(|line| {
                    let product = products.get(&line.product_id).cloned().ok_or_else(|| {
                        AppError::Internal(anyhow::anyhow!(
                            "order item {} references missing product {}",
                            line.id,
                            line.product_id
                        ))
                    })?;
                    Ok(OrderItem {
                        id: line.id,
                        product,
                        quantity: line.quantity,
                        price_at_purchase: line.price_at_purchase,
                    })
                })
                .collect::<AppResult<Vec<_>>>()?;

            let customer = customers.get(&order.user_id).cloned().ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "order {} references missing user {}",
                    order.id,
                    order.user_id
                ))
            })?;

            Ok(Order {
                id: order.id,
                total_price,
                status: order.status,
                created_at: order.created_at.with_timezone(&chrono::Utc),
                order_items,
                payment: payments.remove(&order.id),
                customer: customer.into(),
            })
        })
        .collect()
}

/// Creates the order, its lines and its pending payment in one transaction.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("No items provided".into()));
    }
    let requested = payload
        .items
        .iter()
        .map(|line| Ok((line.product_id, requested_quantity(line.quantity)?)))
        .collect::<AppResult<Vec<(i64, i32)>>>()?;

    // Dropping the transaction on an early return rolls everything back.
    let txn = state.orm.begin().await?;

    let mut priced = Vec::with_capacity(requested.len());
    for (product_id, quantity) in requested {
        let product = Products::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product {product_id}")))?;
        priced.push((product.id, product.price, quantity));
    }
    let total_price = line_total(priced.iter().map(|(_, price, quantity)| (*price, *quantity)));
    ensure_storable_total(total_price)?;

    let order = OrderActive {
        id: NotSet,
        user_id: Set(user.user_id),
        total_price: Set(total_price),
        status: Set(OrderStatus::Pending),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let lines = priced.into_iter().map(|(product_id, price, quantity)| OrderItemActive {
        id: NotSet,
        order_id: Set(order.id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        price_at_purchase: Set(price),
    });
    OrderItems::insert_many(lines).exec(&txn).await?;

    PaymentActive {
        id: NotSet,
        order_id: Set(order.id),
        amount: Set(total_price),
        payment_method: Set(PAYMENT_METHOD_PENDING.to_string()),
        payment_status: Set(PAYMENT_STATUS_PENDING.to_string()),
        transaction_id: Set(None),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        user_id = user.user_id,
        order_id = order.id,
        total = %total_price,
        "order placed"
    );
    audit::record(
        &state.orm,
        Some(user.user_id),
        AuditAction::OrderPlace,
        serde_json::json!({ "order_id": order.id, "total_price": total_price.to_string() }),
    )
    .await;

    let order = hydrate_orders(&state.orm, vec![order]).await?.remove(0);
    Ok(ApiResponse::success(
        "Order placed",
        order,
        Some(Meta::empty()),
    ))
}

/// Paginated order listing, newest first unless asked otherwise.
/// `owner` limits the listing to one customer's orders.
pub async fn query_orders(
    state: &AppState,
    owner: Option<i64>,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(user_id) = owner {
        condition = condition.add(Column::UserId.eq(user_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(Column::Status.eq(status));
    }

    let direction = match query.sort_order {
        Some(SortOrder::Asc) => SortDirection::Asc,
        _ => SortDirection::Desc,
    };

    let finder = Orders::find().filter(condition);
    let total = finder.clone().count(&state.orm).await?;

    let rows = finder
        .order_by(Column::CreatedAt, direction.clone())
        .order_by(Column::Id, direction)
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?;
    let items = hydrate_orders(&state.orm, rows).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", OrderList { items }, Some(meta)))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    query_orders(state, Some(user.user_id), query).await
}

/// An order that belongs to `user_id`. Someone else's order is reported as missing.
pub async fn find_own_order<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    order_id: i64,
) -> AppResult<OrderModel> {
    Orders::find_by_id(order_id)
        .filter(Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    order_id: i64,
) -> AppResult<ApiResponse<Order>> {
    let order = find_own_order(&state.orm, user.user_id, order_id).await?;
    let order = hydrate_orders(&state.orm, vec![order]).await?.remove(0);
    Ok(ApiResponse::success("OK", order, None))
}
