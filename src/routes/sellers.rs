use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{
        orders::OrderList,
        products::ProductList,
        sellers::{DashboardStats, SellerSignupRequest, UpdateSellerRequest},
    },
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::Seller,
    response::ApiResponse,
    services::seller_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sellers/signup/", post(signup))
        .route("/sellers/profile/", get(get_profile).put(update_profile))
        .route("/sellers/my-products/", get(my_products))
        .route("/sellers/my-orders/", get(my_orders))
        .route("/sellers/dashboard-stats/", get(dashboard_stats))
}

#[utoipa::path(
    post,
    path = "/api/sellers/signup/",
    request_body = SellerSignupRequest,
    responses(
        (status = 200, description = "Seller account and shop created", body = ApiResponse<Seller>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "User already exists")
    ),
    tag = "Sellers"
)]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SellerSignupRequest>,
) -> AppResult<Json<ApiResponse<Seller>>> {
    let resp = seller_service::signup(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sellers/profile/",
    responses(
        (status = 200, description = "The caller's shop, created on first access", body = ApiResponse<Seller>),
        (status = 403, description = "Sellers only")
    ),
    security(("bearer_auth" = [])),
    tag = "Sellers"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Seller>>> {
    let resp = seller_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/sellers/profile/",
    request_body = UpdateSellerRequest,
    responses(
        (status = 200, description = "Update the caller's shop", body = ApiResponse<Seller>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Sellers only")
    ),
    security(("bearer_auth" = [])),
    tag = "Sellers"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateSellerRequest>,
) -> AppResult<Json<ApiResponse<Seller>>> {
    let resp = seller_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sellers/my-products/",
    responses(
        (status = 200, description = "Products owned by the caller", body = ApiResponse<ProductList>),
        (status = 403, description = "Sellers only")
    ),
    security(("bearer_auth" = [])),
    tag = "Sellers"
)]
pub async fn my_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = seller_service::my_products(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sellers/my-orders/",
    responses(
        (status = 200, description = "Orders containing the caller's products", body = ApiResponse<OrderList>),
        (status = 403, description = "Sellers only")
    ),
    security(("bearer_auth" = [])),
    tag = "Sellers"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = seller_service::my_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sellers/dashboard-stats/",
    responses(
        (status = 200, description = "Listing, order line and earnings totals", body = ApiResponse<DashboardStats>),
        (status = 403, description = "Sellers only")
    ),
    security(("bearer_auth" = [])),
    tag = "Sellers"
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let resp = seller_service::dashboard_stats(&state, &user).await?;
    Ok(Json(resp))
}
