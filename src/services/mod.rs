pub mod admin_service;
pub mod auth_service;
pub mod cart_service;
pub mod category_service;
pub mod order_service;
pub mod payment_service;
pub mod product_service;
pub mod profile_service;
pub mod seller_service;
pub mod token_service;
pub mod wishlist_service;
