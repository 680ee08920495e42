use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
    sea_query::OnConflict,
};
use validator::Validate;

use crate::{
    audit::{self, AuditAction},
    dto::{
        orders::OrderList,
        products::ProductList,
        sellers::{DashboardStats, SellerSignupRequest, UpdateSellerRequest},
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        products::{Column as ProductCol, Entity as Products},
        sellers::{ActiveModel, Column, Entity as Sellers, Model as SellerModel},
        users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_SELLER, ensure_seller},
    models::{Seller, line_total},
    response::{ApiResponse, Meta},
    services::{auth_service, order_service, product_service},
    state::AppState,
};

/// Creates the seller's user account and shop in one transaction.
pub async fn signup(
    state: &AppState,
    payload: SellerSignupRequest,
) -> AppResult<ApiResponse<Seller>> {
    payload.validate()?;
    let email = payload.email.trim().to_string();
    let username = payload
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| email.clone());
    let password_hash = auth_service::hash_password(&payload.password)?;

    let txn = state.orm.begin().await?;

    if auth_service::find_user_by_email(&txn, &email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let user = UserActive {
        id: NotSet,
        email: Set(email),
        username: Set(username),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        password_hash: Set(Some(password_hash)),
        role: Set(ROLE_SELLER.to_string()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("User already exists".into())
        }
        _ => AppError::from(err),
    })?;

    let now = Utc::now();
    let seller = ActiveModel {
        id: NotSet,
        user_id: Set(user.id),
        shop_name: Set(payload.shop_name),
        phone_number: Set(payload.phone_number),
        address: Set(payload.address),
        website: Set(payload.website),
        bio: Set(payload.bio),
        profile_image: Set(payload.profile_image),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(user_id = user.id, seller_id = seller.id, "seller signed up");
    audit::record(
        &state.orm,
        Some(user.id),
        AuditAction::SellerSignup,
        serde_json::json!({ "seller_id": seller.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Seller created",
        Seller::from_entity(seller, &user),
        Some(Meta::empty()),
    ))
}

/// The caller's shop row, created empty on first access.
pub async fn get_or_create<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<SellerModel> {
    if let Some(seller) = Sellers::find()
        .filter(Column::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(seller);
    }

    let now = Utc::now();
    let blank = ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        shop_name: Set(String::new()),
        phone_number: Set(String::new()),
        address: Set(String::new()),
        website: Set(String::new()),
        bio: Set(String::new()),
        profile_image: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    Sellers::insert(blank)
        .on_conflict(OnConflict::column(Column::UserId).do_nothing().to_owned())
        .do_nothing()
        .exec(conn)
        .await?;
    tracing::debug!(user_id, "seller profile created on first access");

    Sellers::find()
        .filter(Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Seller"))
}

async fn find_user(state: &AppState, user_id: i64) -> AppResult<UserModel> {
    Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Seller>> {
    ensure_seller(user)?;
    let account = find_user(state, user.user_id).await?;
    let seller = get_or_create(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success(
        "OK",
        Seller::from_entity(seller, &account),
        None,
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSellerRequest,
) -> AppResult<ApiResponse<Seller>> {
    ensure_seller(user)?;
    payload.validate()?;
    let account = find_user(state, user.user_id).await?;
    let seller = get_or_create(&state.orm, user.user_id).await?;

    let mut active: ActiveModel = seller.into();
    if let Some(shop_name) = payload.shop_name {
        active.shop_name = Set(shop_name);
    }
    if let Some(phone_number) = payload.phone_number {
        active.phone_number = Set(phone_number);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(website) = payload.website {
        active.website = Set(website);
    }
    if let Some(bio) = payload.bio {
        active.bio = Set(bio);
    }
    if let Some(profile_image) = payload.profile_image {
        active.profile_image = Set(Some(profile_image));
    }
    active.updated_at = Set(Utc::now().into());
    let seller = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        Seller::from_entity(seller, &account),
        Some(Meta::empty()),
    ))
}

pub async fn my_products(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_seller(user)?;
    product_service::list_seller_products(state, user.user_id).await
}

/// Orders with at least one line for the caller's products, each listed once.
pub async fn my_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    ensure_seller(user)?;

    let order_ids: Vec<i64> = OrderItems::find()
        .select_only()
        .column(OrderItemCol::OrderId)
        .distinct()
        .inner_join(Products)
        .filter(ProductCol::SellerId.eq(user.user_id))
        .into_tuple()
        .all(&state.orm)
        .await?;

    let rows = Orders::find()
        .filter(OrderCol::Id.is_in(order_ids))
        .order_by_desc(OrderCol::CreatedAt)
        .order_by_desc(OrderCol::Id)
        .all(&state.orm)
        .await?;
    let items = order_service::hydrate_orders(&state.orm, rows).await?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("OK", OrderList { items }, Some(meta)))
}

pub async fn dashboard_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_seller(user)?;

    let products_listed = Products::find()
        .filter(ProductCol::SellerId.eq(user.user_id))
        .count(&state.orm)
        .await?;

    let lines: Vec<(Decimal, i32)> = OrderItems::find()
        .select_only()
        .column(OrderItemCol::PriceAtPurchase)
        .column(OrderItemCol::Quantity)
        .inner_join(Products)
        .filter(ProductCol::SellerId.eq(user.user_id))
        .into_tuple()
        .all(&state.orm)
        .await?;

    let stats = DashboardStats {
        products_listed,
        total_orders: lines.len() as u64,
        total_earnings: line_total(lines),
    };
    Ok(ApiResponse::success("OK", stats, None))
}
