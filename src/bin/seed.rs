use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, Iterable,
    QueryFilter, Set, sea_query::OnConflict,
};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        categories::{self, CategoryName},
        products::{self, AgeRange},
        users, Categories, Products, Users,
    },
    middleware::auth::{ROLE_ADMIN, ROLE_SELLER},
    services::{auth_service::hash_password, seller_service},
    slugs::base_slug,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    seed_categories(&orm).await?;
    let admin_id = ensure_user_with_role(&orm, "admin@example.com", "admin12345", ROLE_ADMIN).await?;
    let seller_id =
        ensure_user_with_role(&orm, "seller@example.com", "seller12345", ROLE_SELLER).await?;
    seller_service::get_or_create(&orm, seller_id).await?;
    seed_products(&orm, seller_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Seller ID: {seller_id}");
    Ok(())
}

async fn seed_categories(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for name in CategoryName::iter() {
        let category = categories::ActiveModel {
            id: NotSet,
            name: Set(name),
            slug: Set(base_slug(name.label())),
        };
        Categories::insert(category)
            .on_conflict(
                OnConflict::column(categories::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(orm)
            .await?;
    }
    println!("Seeded categories");
    Ok(())
}

async fn ensure_user_with_role(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<i64> {
    let existing = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?;

    let user = match existing {
        Some(user) => {
            let mut active: users::ActiveModel = user.into();
            active.role = Set(role.to_string());
            active.update(orm).await?
        }
        None => {
            let password_hash = hash_password(password)?;
            users::ActiveModel {
                id: NotSet,
                email: Set(email.to_string()),
                username: Set(email.to_string()),
                first_name: Set(String::new()),
                last_name: Set(String::new()),
                password_hash: Set(Some(password_hash)),
                role: Set(role.to_string()),
                created_at: NotSet,
            }
            .insert(orm)
            .await?
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user.id)
}

async fn seed_products(orm: &DatabaseConnection, seller_id: i64) -> anyhow::Result<()> {
    let products = vec![
        (
            "Wooden Train Set",
            "Forty piece track with magnetic carriages",
            CategoryName::Toys,
            Decimal::new(149_900, 2),
            Some(Decimal::new(199_900, 2)),
            AgeRange::Toddler,
        ),
        (
            "Organic Cotton Romper",
            "Soft snap-button romper",
            CategoryName::KidsClothing,
            Decimal::new(59_900, 2),
            None,
            AgeRange::Infant,
        ),
        (
            "Junior Football",
            "Size 3 stitched ball",
            CategoryName::Sports,
            Decimal::new(45_000, 2),
            Some(Decimal::new(60_000, 2)),
            AgeRange::Child,
        ),
        (
            "Watercolour Starter Kit",
            "Twenty four colours with brushes and pad",
            CategoryName::ArtsAndCrafts,
            Decimal::new(79_900, 2),
            None,
            AgeRange::EarlyChild,
        ),
    ];

    for (name, description, category, price, original_price, age_range) in products {
        let slug = base_slug(name);
        let exists = Products::find()
            .filter(products::Column::Slug.eq(slug.clone()))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let category = Categories::find()
            .filter(categories::Column::Name.eq(category))
            .one(orm)
            .await?
            .ok_or_else(|| anyhow::anyhow!("category {} missing", category.label()))?;

        products::ActiveModel {
            id: NotSet,
            seller_id: Set(Some(seller_id)),
            category_id: Set(category.id),
            name: Set(name.to_string()),
            slug: Set(slug),
            description: Set(description.to_string()),
            price: Set(price),
            original_price: Set(original_price),
            rating: Set(0.0),
            review_count: Set(0),
            age_range: Set(age_range),
            is_new: Set(true),
            is_sale: Set(original_price.is_some()),
            location: Set(None),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
