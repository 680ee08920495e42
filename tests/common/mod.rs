#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
    sea_query::OnConflict,
};
use storefront_api::{
    config::{AppConfig, AuthConfig},
    db::{create_orm_conn, run_migrations},
    entity::{
        Categories,
        categories::{self, CategoryName},
        products::{self, AgeRange},
        users,
    },
    integrations::{
        mailer::{MailError, Mailer},
        payments::{PaymentGateway, PaymentGatewayError, PaymentIntent, PaymentIntentRequest},
    },
    middleware::auth::AuthUser,
    state::AppState,
};
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATIONS: OnceCell<()> = OnceCell::const_new();

/// Records every OTP instead of sending it.
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingMailer {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    pub fn count_for(&self, email: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == email)
            .count()
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send_otp(&self, to: &str, code: &str) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), code.to_string()));
        Ok(())
    }
}

/// Hands out predictable intents and remembers what it was asked for.
#[derive(Default)]
pub struct FakeGateway {
    requests: Mutex<Vec<PaymentIntentRequest>>,
}

impl FakeGateway {
    pub fn requests(&self) -> Vec<PaymentIntentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentGatewayError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        let n = requests.len();
        Ok(PaymentIntent {
            id: format!("pi_test_{n}"),
            client_secret: format!("pi_test_{n}_secret"),
        })
    }
}

pub struct TestApp {
    pub state: AppState,
    pub mailer: Arc<CapturingMailer>,
    pub gateway: Arc<FakeGateway>,
}

/// `None` when no database is configured; callers skip in that case.
pub async fn setup() -> anyhow::Result<Option<TestApp>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    MIGRATIONS
        .get_or_try_init(|| async { run_migrations(&orm).await })
        .await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        auth: AuthConfig::with_secret("integration-test-secret"),
        cors_allowed_origins: vec!["http://localhost:5173".into()],
        smtp: None,
        stripe: None,
        payment_currency: "inr".into(),
        external_timeout: std::time::Duration::from_secs(5),
    };

    let mailer = Arc::new(CapturingMailer::default());
    let gateway = Arc::new(FakeGateway::default());
    let state = AppState {
        orm,
        config: Arc::new(config),
        mailer: mailer.clone(),
        payments: gateway.clone(),
    };

    Ok(Some(TestApp {
        state,
        mailer,
        gateway,
    }))
}

/// An address no other test run has used.
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

pub async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let email = unique_email(role);
    let user = users::ActiveModel {
        id: NotSet,
        email: Set(email.clone()),
        username: Set(email),
        first_name: Set("Test".into()),
        last_name: Set("User".into()),
        password_hash: Set(None),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn category(state: &AppState, name: CategoryName) -> anyhow::Result<categories::Model> {
    Categories::insert(categories::ActiveModel {
        id: NotSet,
        name: Set(name),
        slug: Set(storefront_api::slugs::base_slug(name.label())),
    })
    .on_conflict(
        OnConflict::column(categories::Column::Name)
            .do_nothing()
            .to_owned(),
    )
    .do_nothing()
    .exec(&state.orm)
    .await?;

    Categories::find()
        .filter(categories::Column::Name.eq(name))
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("category {} missing", name.label()))
}

pub async fn create_product(
    state: &AppState,
    seller_id: Option<i64>,
    category_id: i64,
    price: Decimal,
) -> anyhow::Result<products::Model> {
    let name = format!("Test Product {}", Uuid::new_v4().simple());
    let product = products::ActiveModel {
        id: NotSet,
        seller_id: Set(seller_id),
        category_id: Set(category_id),
        slug: Set(storefront_api::slugs::base_slug(&name)),
        name: Set(name),
        description: Set("integration test product".into()),
        price: Set(price),
        original_price: Set(None),
        rating: Set(0.0),
        review_count: Set(0),
        age_range: Set(AgeRange::Child),
        is_new: Set(false),
        is_sale: Set(false),
        location: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}
