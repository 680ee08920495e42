use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            AccessTokenResponse, LoginOtpRequest, LoginResponse, OtpDispatched,
            PasswordLoginRequest, RefreshRequest, SessionUser, SignupRequest, VerifyOtpRequest,
        },
        cart::{AddToCartRequest, CartList, UpdateCartItemRequest},
        categories::{CategoryList, CreateCategoryRequest},
        orders::{
            CreatePaymentIntentRequest, OrderLineRequest, OrderList, PaymentIntentResponse,
            PlaceOrderRequest, UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        profile::UpdateProfileRequest,
        sellers::{DashboardStats, SellerSignupRequest, UpdateSellerRequest},
        wishlist::{AddWishlistItemRequest, WishlistList},
    },
    entity::{categories::CategoryName, orders::OrderStatus, products::AgeRange},
    models::{
        CartItem, Category, Customer, Order, OrderItem, Payment, Product, Profile, Seller,
        SellerAccount, WishlistItem,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, categories, health, orders, params, products as product_routes,
        profile, sellers, wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::signup,
        auth::login,
        auth::verify_otp,
        auth::password_login,
        auth::refresh,
        auth::logout,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        product_routes::list_products,
        product_routes::create_product,
        product_routes::get_product,
        product_routes::update_product,
        product_routes::delete_product,
        product_routes::related_products,
        cart::cart_list,
        cart::add_to_cart,
        cart::get_cart_item,
        cart::update_cart_item,
        cart::remove_from_cart,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        orders::list_orders,
        orders::place_order,
        orders::get_order,
        orders::create_payment_intent,
        profile::get_profile,
        profile::update_profile,
        sellers::signup,
        sellers::get_profile,
        sellers::update_profile,
        sellers::my_products,
        sellers::my_orders,
        sellers::dashboard_stats,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status
    ),
    components(
        schemas(
            Category,
            CategoryName,
            Product,
            AgeRange,
            CartItem,
            WishlistItem,
            Order,
            OrderItem,
            OrderStatus,
            Payment,
            Customer,
            Profile,
            Seller,
            SellerAccount,
            SignupRequest,
            LoginOtpRequest,
            VerifyOtpRequest,
            PasswordLoginRequest,
            RefreshRequest,
            OtpDispatched,
            SessionUser,
            LoginResponse,
            AccessTokenResponse,
            CreateCategoryRequest,
            CategoryList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartList,
            AddWishlistItemRequest,
            WishlistList,
            OrderLineRequest,
            PlaceOrderRequest,
            CreatePaymentIntentRequest,
            PaymentIntentResponse,
            UpdateOrderStatusRequest,
            OrderList,
            UpdateProfileRequest,
            SellerSignupRequest,
            UpdateSellerRequest,
            DashboardStats,
            params::Pagination,
            params::SortOrder,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "OTP, password and refresh credential endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Orders", description = "Order and payment intent endpoints"),
        (name = "Profile", description = "Customer profile endpoints"),
        (name = "Sellers", description = "Seller onboarding and dashboard endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_trailing_slash_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/auth/verify-otp/"));
        assert!(paths.contains_key("/api/orders/create-payment-intent/"));
        assert!(paths.contains_key("/api/products/{id}/related/"));
        assert!(paths.contains_key("/api/sellers/dashboard-stats/"));
    }
}
