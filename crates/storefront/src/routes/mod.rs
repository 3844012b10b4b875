//! HTTP route handlers for the storefront.
//!
//! Thin JSON handlers over the service graph - every decision lives in
//! `services`, the handlers only translate requests and responses.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Health check
//!
//! # Products
//! GET  /products                - Grouped product listing (filtered)
//! GET  /filter                  - Current listing filter
//! PUT  /filter                  - Update search / category
//!
//! # Cart
//! GET    /cart                  - Cart contents and subtotal
//! POST   /cart/items            - Add to cart (guest-gated)
//! PATCH  /cart/items/{id}       - Change quantity
//! DELETE /cart/items/{id}       - Remove item
//! DELETE /cart                  - Clear cart
//!
//! # Checkout
//! POST /checkout                - Place order (cod) or request payment (online)
//! POST /checkout/complete       - Payment widget success callback
//! POST /checkout/buy-now        - Buy a single line (guest-gated)
//! GET  /checkout/pincode/{code} - City/state prefill for a postal code
//!
//! # Auth
//! POST /auth/login              - Sign in, replaying any captured guest action
//! POST /auth/register           - Create account (signed out afterwards)
//! POST /auth/logout             - Sign out
//! POST /auth/dismiss            - Login modal dismissed without signing in
//! GET  /auth/me                 - Current identity and profile
//!
//! # Admin (requires is_admin profile flag)
//! GET    /admin/overview        - Dashboard stats
//! GET    /admin/products        - Ungrouped product rows
//! POST   /admin/products        - Create product
//! PUT    /admin/products/{id}   - Update product
//! DELETE /admin/products/{id}   - Delete product
//! GET    /admin/users           - User profiles (optional ?q= name filter)
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/dismiss", post(auth::dismiss))
        .route("/me", get(auth::me))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{id}", delete(cart::remove).patch(cart::update))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::place))
        .route("/complete", post(checkout::complete))
        .route("/buy-now", post(checkout::buy_now))
        .route("/pincode/{code}", get(checkout::pincode))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/overview", get(admin::overview))
        .route("/products", get(admin::list_products).post(admin::add_product))
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/users", get(admin::list_users))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list))
        .route("/filter", get(products::get_filter).put(products::put_filter))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
}
