use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod profile;
pub mod sellers;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
// Every route carries its full path with the trailing slash clients use.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(cart::router())
        .merge(wishlist::router())
        .merge(orders::router())
        .merge(profile::router())
        .merge(sellers::router())
        .merge(admin::router())
}
