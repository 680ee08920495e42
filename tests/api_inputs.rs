mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::{Value, json};
use storefront_api::{
    entity::{Products, Users, categories::CategoryName, products},
    middleware::auth::AuthUser,
    routes::create_api_router,
    services::token_service,
    state::AppState,
};
use tower::ServiceExt;

struct Client {
    router: Router,
    token: String,
}

impl Client {
    async fn new(state: &AppState, user: &AuthUser) -> anyhow::Result<Self> {
        let model = Users::find_by_id(user.user_id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user {} missing", user.user_id))?;
        let session = token_service::issue_session(&state.config.auth, model)?;
        let router = Router::new()
            .nest("/api", create_api_router())
            .with_state(state.clone());
        Ok(Self {
            router,
            token: session.access,
        })
    }

    /// Sends a raw JSON body and returns the status with the decoded envelope.
    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Value,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?;
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }
}

#[tokio::test]
async fn order_lines_accept_numeric_strings() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let buyer = common::create_user(state, "user").await?;
    let toys = common::category(state, CategoryName::Toys).await?;
    let product = common::create_product(state, None, toys.id, dec!(4.00)).await?;
    let client = Client::new(state, &buyer).await?;

    let (status, body) = client
        .send(
            Method::POST,
            "/api/orders/",
            json!({ "items": [{ "product": product.id.to_string(), "quantity": "2" }] }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["order_items"][0]["quantity"], 2);
    assert_eq!(body["data"]["total_price"], "8.00");

    let order_id = body["data"]["id"].as_i64().expect("order id");
    let (status, body) = client
        .send(
            Method::POST,
            "/api/orders/create-payment-intent/",
            json!({ "order_id": order_id.to_string() }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["order_id"], order_id);
    Ok(())
}

#[tokio::test]
async fn unparsable_quantity_falls_back_to_one() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let buyer = common::create_user(state, "user").await?;
    let toys = common::category(state, CategoryName::Toys).await?;
    let product = common::create_product(state, None, toys.id, dec!(4.00)).await?;
    let client = Client::new(state, &buyer).await?;

    let (status, body) = client
        .send(
            Method::POST,
            "/api/orders/",
            json!({ "items": [{ "product_id": product.id, "quantity": "abc" }] }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["order_items"][0]["quantity"], 1);
    assert_eq!(body["data"]["total_price"], "4.00");
    Ok(())
}

#[tokio::test]
async fn malformed_ids_get_the_error_envelope() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let buyer = common::create_user(state, "user").await?;
    let client = Client::new(state, &buyer).await?;

    let (status, body) = client
        .send(
            Method::POST,
            "/api/orders/",
            json!({ "items": [{ "product": "abc", "quantity": 1 }] }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert_eq!(body["data"]["error"], body["message"]);

    let (status, body) = client
        .send(Method::POST, "/api/wishlist-items/", json!({ "product_id": [1] }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["error"], body["message"]);

    let (status, _) = client
        .send(
            Method::POST,
            "/api/orders/create-payment-intent/",
            json!({ "order_id": "twelve" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn cart_quantity_accepts_numeric_strings() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let buyer = common::create_user(state, "user").await?;
    let sports = common::category(state, CategoryName::Sports).await?;
    let product = common::create_product(state, None, sports.id, dec!(3.00)).await?;
    let client = Client::new(state, &buyer).await?;

    let (status, body) = client
        .send(
            Method::POST,
            "/api/cart/",
            json!({ "product": product.id.to_string(), "quantity": "3" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["quantity"], 3);

    let (status, body) = client
        .send(
            Method::POST,
            "/api/cart/",
            json!({ "product_id": product.id, "quantity": "2" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["quantity"], 5);
    Ok(())
}

#[tokio::test]
async fn product_update_can_clear_optional_fields() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let seller = common::create_user(state, "seller").await?;
    let toys = common::category(state, CategoryName::Toys).await?;
    let product =
        common::create_product(state, Some(seller.user_id), toys.id, dec!(8.00)).await?;
    let mut active: products::ActiveModel = product.clone().into();
    active.original_price = Set(Some(dec!(10.00)));
    active.location = Set(Some("Pune".into()));
    active.update(&state.orm).await?;
    let client = Client::new(state, &seller).await?;
    let uri = format!("/api/products/{}/", product.id);

    let (status, body) = client
        .send(Method::PUT, &uri, json!({ "name": "Renamed kite" }))
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["original_price"], "10.00");
    assert_eq!(body["data"]["location"], "Pune");
    assert_eq!(body["data"]["discount_percentage"], 20);

    let (status, body) = client
        .send(
            Method::PUT,
            &uri,
            json!({ "original_price": null, "location": null }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["data"]["original_price"].is_null());
    assert!(body["data"]["location"].is_null());
    assert_eq!(body["data"]["discount_percentage"], 0);

    let stored = Products::find_by_id(product.id)
        .one(&state.orm)
        .await?
        .expect("product kept");
    assert_eq!(stored.original_price, None);
    assert_eq!(stored.location, None);
    Ok(())
}

#[tokio::test]
async fn search_treats_wildcards_literally() -> anyhow::Result<()> {
    let Some(app) = common::setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let buyer = common::create_user(state, "user").await?;
    let toys = common::category(state, CategoryName::Toys).await?;
    let tag = uuid::Uuid::new_v4().simple().to_string();
    for name in [format!("Kite 5% {tag}"), format!("Kite 5x {tag}")] {
        let product = common::create_product(state, None, toys.id, dec!(2.00)).await?;
        let mut active: products::ActiveModel = product.into();
        active.name = Set(name);
        active.update(&state.orm).await?;
    }
    let client = Client::new(state, &buyer).await?;

    let request = Request::builder()
        .uri(format!("/api/products/?search=5%25%20{tag}"))
        .body(Body::empty())?;
    let response = client.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    let names: Vec<&str> = body["data"]
        .as_array()
        .expect("product list")
        .iter()
        .filter_map(|product| product["name"].as_str())
        .collect();
    assert_eq!(names, vec![format!("Kite 5% {tag}").as_str()]);
    Ok(())
}
