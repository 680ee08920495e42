use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    sea_query::{Expr, Func, extension::postgres::PgExpr},
};
use validator::Validate;

use crate::{
    audit::{self, AuditAction},
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        categories::{Column as CatCol, Entity as Categories},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_seller},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    slugs::unique_slug,
    state::AppState,
};

const RELATED_LIMIT: u64 = 4;

/// Attaches categories to product rows, keeping the input order.
pub async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    let mut category_ids: Vec<i64> = models.iter().map(|p| p.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();

    let categories: HashMap<i64, _> = Categories::find()
        .filter(CatCol::Id.is_in(category_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    models
        .into_iter()
        .map(|model| {
            let category = categories.get(&model.category_id).cloned().ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "product {} references missing category {}",
                    model.id,
                    model.category_id
                ))
            })?;
            Ok(Product::from_entity(model, category))
        })
        .collect()
}

/// Hydrated products keyed by id.
pub async fn hydrate_by_id<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<i64>,
) -> AppResult<HashMap<i64, Product>> {
    let models = Products::find().filter(Column::Id.is_in(ids)).all(conn).await?;
    Ok(hydrate(conn, models)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect())
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(slug) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(
            Expr::expr(Func::lower(Expr::col((Categories, CatCol::Slug)))).eq(slug.to_lowercase()),
        );
    }

    if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col((Products, Column::Name)).ilike(pattern.clone()))
                .add(Expr::col((Categories, CatCol::Name)).ilike(pattern)),
        );
    }

    let finder = Products::find()
        .inner_join(Categories)
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id);

    let total = finder.clone().count(&state.orm).await?;

    let models = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?;
    let items = hydrate(&state.orm, models).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: i64) -> AppResult<ApiResponse<Product>> {
    let model = find_product(state, id).await?;
    let product = hydrate(&state.orm, vec![model]).await?.remove(0);
    Ok(ApiResponse::success("Product", product, None))
}

/// Up to four other products from the same category.
pub async fn related_products(state: &AppState, id: i64) -> AppResult<ApiResponse<ProductList>> {
    let product = find_product(state, id).await?;

    let models = Products::find()
        .filter(Column::CategoryId.eq(product.category_id))
        .filter(Column::Id.ne(product.id))
        .order_by_desc(Column::CreatedAt)
        .limit(RELATED_LIMIT)
        .all(&state.orm)
        .await?;
    let items = hydrate(&state.orm, models).await?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Related products", ProductList { items }, Some(meta)))
}

pub async fn list_seller_products(
    state: &AppState,
    seller_id: i64,
) -> AppResult<ApiResponse<ProductList>> {
    let models = Products::find()
        .filter(Column::SellerId.eq(seller_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?;
    let items = hydrate(&state.orm, models).await?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_seller(user)?;
    payload.validate()?;
    validate_prices(payload.price, payload.original_price)?;
    ensure_category(state, payload.category_id).await?;

    let slug = unique_slug::<Products, _>(&state.orm, Column::Slug, &payload.name).await?;
    let active = ActiveModel {
        id: NotSet,
        seller_id: Set(Some(user.user_id)),
        category_id: Set(payload.category_id),
        name: Set(payload.name),
        slug: Set(slug),
        description: Set(payload.description),
        price: Set(payload.price),
        original_price: Set(payload.original_price),
        rating: Set(0.0),
        review_count: Set(0),
        age_range: Set(payload.age_range),
        is_new: Set(payload.is_new),
        is_sale: Set(payload.is_sale),
        location: Set(payload.location),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Slug collision, please retry".into())
        }
        _ => AppError::from(err),
    })?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        AuditAction::ProductCreate,
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let product = hydrate(&state.orm, vec![product]).await?.remove(0);
    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    payload.validate()?;
    let existing = find_product(state, id).await?;
    ensure_owner(user, &existing)?;

    let price = payload.price.unwrap_or(existing.price);
    let original_price = payload
        .original_price
        .unwrap_or(existing.original_price);
    validate_prices(price, original_price)?;

    let mut active: ActiveModel = existing.into();
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(original_price) = payload.original_price {
        active.original_price = Set(original_price);
    }
    if let Some(age_range) = payload.age_range {
        active.age_range = Set(age_range);
    }
    if let Some(is_new) = payload.is_new {
        active.is_new = Set(is_new);
    }
    if let Some(is_sale) = payload.is_sale {
        active.is_sale = Set(is_sale);
    }
    if let Some(location) = payload.location {
        active.location = Set(location);
    }

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        AuditAction::ProductUpdate,
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let product = hydrate(&state.orm, vec![product]).await?.remove(0);
    Ok(ApiResponse::success(
        "Updated",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_product(state, id).await?;
    ensure_owner(user, &existing)?;

    let referenced = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;
    if referenced > 0 {
        return Err(AppError::Conflict(
            "Product is referenced by existing orders".into(),
        ));
    }

    let result = Products::delete_by_id(id)
        .exec(&state.orm)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                AppError::Conflict("Product is referenced by existing orders".into())
            }
            _ => AppError::from(err),
        })?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found(format!("Product {id}")));
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        AuditAction::ProductDelete,
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_product(state: &AppState, id: i64) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))
}

async fn ensure_category(state: &AppState, category_id: i64) -> AppResult<()> {
    Categories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest(format!("Invalid category_id {category_id}")))
}

fn ensure_owner(user: &AuthUser, product: &ProductModel) -> AppResult<()> {
    if user.is_admin() || product.seller_id == Some(user.user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// `ILIKE` pattern matching `search` anywhere, with its wildcards taken literally.
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Prices live in `NUMERIC(10, 2)`.
fn price_in_range(price: Decimal) -> bool {
    !price.is_sign_negative() && price < Decimal::from(100_000_000_i64)
}

fn validate_prices(price: Decimal, original_price: Option<Decimal>) -> AppResult<()> {
    if !price_in_range(price) {
        return Err(AppError::BadRequest(
            "price must be between 0 and 99999999.99".into(),
        ));
    }
    if original_price.is_some_and(|p| !price_in_range(p)) {
        return Err(AppError::BadRequest(
            "original_price must be between 0 and 99999999.99".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use crate::entity::products::AgeRange;

    fn product(seller_id: Option<i64>) -> ProductModel {
        ProductModel {
            id: 1,
            seller_id,
            category_id: 1,
            name: "Kite".into(),
            slug: "kite".into(),
            description: String::new(),
            price: dec!(10.00),
            original_price: None,
            rating: 0.0,
            review_count: 0,
            age_range: AgeRange::Child,
            is_new: false,
            is_sale: false,
            location: None,
            created_at: Utc::now().into(),
        }
    }

    fn user(id: i64, role: &str) -> AuthUser {
        AuthUser {
            user_id: id,
            role: role.into(),
        }
    }

    #[test]
    fn only_owner_or_admin_may_modify() {
        assert!(ensure_owner(&user(5, "seller"), &product(Some(5))).is_ok());
        assert!(ensure_owner(&user(9, "admin"), &product(Some(5))).is_ok());
        assert!(matches!(
            ensure_owner(&user(6, "seller"), &product(Some(5))),
            Err(AppError::Forbidden)
        ));
        assert!(ensure_owner(&user(6, "seller"), &product(None)).is_err());
    }

    #[test]
    fn negative_prices_are_rejected() {
        assert!(validate_prices(dec!(0.00), None).is_ok());
        assert!(validate_prices(dec!(-1.00), None).is_err());
        assert!(validate_prices(dec!(5.00), Some(dec!(-5.00))).is_err());
    }

    #[test]
    fn prices_must_fit_the_column() {
        assert!(validate_prices(dec!(99999999.99), None).is_ok());
        assert!(validate_prices(dec!(100000000.00), None).is_err());
    }

    #[test]
    fn search_wildcards_are_literal() {
        assert_eq!(contains_pattern("lego"), "%lego%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
