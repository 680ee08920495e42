use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Alias, Expr, LockType, OnConflict},
};

use crate::{
    dto::cart::{AddToCartRequest, CartList, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel, Column, Entity as CartItems, Model as CartModel},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    response::{ApiResponse, Meta},
    services::product_service,
    state::AppState,
};

/// Quantity from a request body: absent means 1, anything below 1 is rejected.
pub fn requested_quantity(quantity: Option<i32>) -> AppResult<i32> {
    let quantity = quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }
    Ok(quantity)
}

/// Quantity after adding `added` to a line already holding `current`.
pub fn merged_quantity(current: i32, added: i32) -> AppResult<i32> {
    current
        .checked_add(added)
        .ok_or_else(|| AppError::BadRequest("Cart quantity is too large".into()))
}

async fn hydrate<C: ConnectionTrait>(conn: &C, rows: Vec<CartModel>) -> AppResult<Vec<CartItem>> {
    let ids = rows.iter().map(|row| row.product_id).collect();
    let mut products = product_service::hydrate_by_id(conn, ids).await?;

    rows.into_iter()
        .map(|row| {
            let product = products.remove(&row.product_id).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "cart item {} references missing product {}",
                    row.id,
                    row.product_id
                ))
            })?;
            Ok(CartItem {
                id: row.id,
                product,
                quantity: row.quantity,
            })
        })
        .collect()
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let rows = CartItems::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .all(&state.orm)
        .await?;
    let items = hydrate(&state.orm, rows).await?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

/// Adds to the caller's cart: a new pair starts at the requested quantity,
/// an existing pair is incremented by it.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let quantity = requested_quantity(payload.quantity)?;

    let txn = state.orm.begin().await?;

    Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {}", payload.product_id)))?;

    let existing = CartItems::find()
        .filter(Column::UserId.eq(user.user_id))
        .filter(Column::ProductId.eq(payload.product_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    if let Some(existing) = existing {
        merged_quantity(existing.quantity, quantity)?;
    }

    let entry = ActiveModel {
        id: NotSet,
        user_id: Set(user.user_id),
        product_id: Set(payload.product_id),
        quantity: Set(quantity),
        created_at: NotSet,
    };

    // The increment happens inside the INSERT, so concurrent adds never lose an update.
    let row = CartItems::insert(entry)
        .on_conflict(
            OnConflict::columns([Column::UserId, Column::ProductId])
                .value(
                    Column::Quantity,
                    Expr::col((CartItems, Column::Quantity))
                        .add(Expr::col((Alias::new("excluded"), Column::Quantity))),
                )
                .to_owned(),
        )
        .exec_with_returning(&txn)
        .await?;

    txn.commit().await?;

    tracing::debug!(
        user_id = user.user_id,
        product_id = row.product_id,
        quantity = row.quantity,
        "cart updated"
    );

    let item = hydrate(&state.orm, vec![row]).await?.remove(0);
    Ok(ApiResponse::success("Added to cart", item, Some(Meta::empty())))
}

pub async fn get_cart_item(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<CartItem>> {
    let row = find_own(state, user, id).await?;
    let item = hydrate(&state.orm, vec![row]).await?.remove(0);
    Ok(ApiResponse::success("OK", item, None))
}

/// Sets the quantity of one of the caller's cart items.
pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let quantity = payload
        .quantity
        .ok_or_else(|| AppError::BadRequest("quantity must be a number".into()))?;
    let quantity = requested_quantity(Some(quantity))?;
    let row = find_own(state, user, id).await?;

    let mut active: ActiveModel = row.into();
    active.quantity = Set(quantity);
    let row = active.update(&state.orm).await?;

    let item = hydrate(&state.orm, vec![row]).await?.remove(0);
    Ok(ApiResponse::success("Updated", item, Some(Meta::empty())))
}

pub async fn remove_cart_item(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found(format!("Cart item {id}")));
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_own(state: &AppState, user: &AuthUser, id: i64) -> AppResult<CartModel> {
    CartItems::find_by_id(id)
        .filter(Column::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Cart item {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_quantity_means_one() {
        assert_eq!(requested_quantity(None).unwrap(), 1);
        assert_eq!(requested_quantity(Some(3)).unwrap(), 3);
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        assert!(matches!(
            requested_quantity(Some(0)),
            Err(AppError::BadRequest(_))
        ));
        assert!(requested_quantity(Some(-2)).is_err());
    }

    #[test]
    fn merging_past_the_column_range_is_rejected() {
        assert_eq!(merged_quantity(3, 2).unwrap(), 5);
        assert!(matches!(
            merged_quantity(i32::MAX, 1),
            Err(AppError::BadRequest(_))
        ));
    }
}
