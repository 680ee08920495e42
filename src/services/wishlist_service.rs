use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};

use crate::{
    dto::wishlist::{AddWishlistItemRequest, WishlistList},
    entity::{
        products::Entity as Products,
        wishlist_items::{ActiveModel, Column, Entity as WishlistItems, Model as WishlistModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::WishlistItem,
    response::{ApiResponse, Meta},
    services::product_service,
    state::AppState,
};

async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<WishlistModel>,
) -> AppResult<Vec<WishlistItem>> {
    let ids = rows.iter().map(|row| row.product_id).collect();
    let mut products = product_service::hydrate_by_id(conn, ids).await?;

    rows.into_iter()
        .map(|row| {
            let product = products.remove(&row.product_id).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "wishlist item {} references missing product {}",
                    row.id,
                    row.product_id
                ))
            })?;
            Ok(WishlistItem {
                id: row.id,
                product,
            })
        })
        .collect()
}

pub async fn list_wishlist(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<WishlistList>> {
    let rows = WishlistItems::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .all(&state.orm)
        .await?;
    let items = hydrate(&state.orm, rows).await?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("OK", WishlistList { items }, Some(meta)))
}

/// Adding a product that is already wishlisted returns the existing entry.
pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    payload: AddWishlistItemRequest,
) -> AppResult<ApiResponse<WishlistItem>> {
    Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {}", payload.product_id)))?;

    let entry = ActiveModel {
        id: NotSet,
        user_id: Set(user.user_id),
        product_id: Set(payload.product_id),
        created_at: NotSet,
    };
    WishlistItems::insert(entry)
        .on_conflict(
            OnConflict::columns([Column::UserId, Column::ProductId])
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(&state.orm)
        .await?;

    let row = WishlistItems::find()
        .filter(Column::UserId.eq(user.user_id))
        .filter(Column::ProductId.eq(payload.product_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {}", payload.product_id)))?;

    let item = hydrate(&state.orm, vec![row]).await?.remove(0);
    Ok(ApiResponse::success(
        "Added to wishlist",
        item,
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = WishlistItems::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found(format!("Wishlist item {id}")));
    }

    Ok(ApiResponse::success(
        "Removed from wishlist",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
