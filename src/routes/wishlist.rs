use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};

use crate::{
    dto::wishlist::{AddWishlistItemRequest, WishlistList},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::WishlistItem,
    response::ApiResponse,
    services::wishlist_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wishlist-items/", get(list_wishlist).post(add_to_wishlist))
        .route("/wishlist-items/{id}/", delete(remove_from_wishlist))
}

#[utoipa::path(
    get,
    path = "/api/wishlist-items/",
    responses(
        (status = 200, description = "List the caller's wishlist", body = ApiResponse<WishlistList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WishlistList>>> {
    let resp = wishlist_service::list_wishlist(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wishlist-items/",
    request_body = AddWishlistItemRequest,
    responses(
        (status = 200, description = "Wishlist entry, existing or new", body = ApiResponse<WishlistItem>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<AddWishlistItemRequest>,
) -> AppResult<Json<ApiResponse<WishlistItem>>> {
    let resp = wishlist_service::add_to_wishlist(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist-items/{id}/",
    params(("id" = i64, Path, description = "Wishlist item id")),
    responses(
        (status = 200, description = "Remove wishlist item"),
        (status = 404, description = "Wishlist item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = wishlist_service::remove_from_wishlist(&state, &user, id).await?;
    Ok(Json(resp))
}
