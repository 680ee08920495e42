pub mod auth;
pub mod cart;
pub mod categories;
pub mod fields;
pub mod orders;
pub mod products;
pub mod profile;
pub mod sellers;
pub mod wishlist;
