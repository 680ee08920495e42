pub mod audit_logs;
pub mod cart_items;
pub mod categories;
pub mod order_items;
pub mod orders;
pub mod otps;
pub mod payments;
pub mod products;
pub mod sellers;
pub mod token_blacklist;
pub mod user_profiles;
pub mod users;
pub mod wishlist_items;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use otps::Entity as Otps;
pub use payments::Entity as Payments;
pub use products::Entity as Products;
pub use sellers::Entity as Sellers;
pub use token_blacklist::Entity as TokenBlacklist;
pub use user_profiles::Entity as UserProfiles;
pub use users::Entity as Users;
pub use wishlist_items::Entity as WishlistItems;
