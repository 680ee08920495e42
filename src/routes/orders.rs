use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};

use crate::{
    dto::orders::{CreatePaymentIntentRequest, OrderList, PaymentIntentResponse, PlaceOrderRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::Order,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{order_service, payment_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/", get(list_orders).post(place_order))
        .route(
            "/orders/create-payment-intent/",
            post(create_payment_intent),
        )
        .route("/orders/{id}/", get(get_order))
}

#[utoipa::path(
    get,
    path = "/api/orders/",
    params(OrderListQuery),
    responses(
        (status = 200, description = "The caller's orders, newest first", body = ApiResponse<OrderList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Order placed with a pending payment", body = ApiResponse<Order>),
        (status = 400, description = "No items provided or quantity below 1"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Get one of the caller's orders", body = ApiResponse<Order>),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/create-payment-intent/",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Gateway client secret for the order", body = ApiResponse<PaymentIntentResponse>),
        (status = 400, description = "Order ID is required"),
        (status = 404, description = "Order not found"),
        (status = 502, description = "Payment gateway failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreatePaymentIntentRequest>,
) -> AppResult<Json<ApiResponse<PaymentIntentResponse>>> {
    let resp = payment_service::create_payment_intent(&state, &user, payload).await?;
    Ok(Json(resp))
}
