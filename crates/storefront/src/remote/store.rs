//! The typed boundary to the hosted backend.

use async_trait::async_trait;

use greengrocer_core::{CartItemId, Email, ProductId, UserId};

use super::RemoteError;
use super::types::{
    AuthSession, CartRow, NewCartRow, NewProduct, OrderRow, ProductRow, ProfileRow,
};

/// Typed CRUD over the hosted backend's collections plus its auth sub-API.
///
/// The production implementation is [`super::RestStore`]; tests drive the
/// services against an in-memory double. Per-user collections (`cart`,
/// `orders`, `profiles`) are keyed by the auth service's user id; mutations
/// on them are scoped by the owning user id as a defense against cross-user
/// id guessing.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    // =========================================================================
    // Auth sub-API
    // =========================================================================

    /// Sign in with email and password.
    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthSession, RemoteError>;

    /// Register a new account with email and password.
    async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthSession, RemoteError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), RemoteError>;

    // =========================================================================
    // profiles
    // =========================================================================

    /// Fetch the profile for a user, if one exists.
    async fn profile(&self, user_id: UserId) -> Result<Option<ProfileRow>, RemoteError>;

    /// Resolve a mobile number to the email it was registered with.
    async fn email_for_mobile(&self, mobile: &str) -> Result<Option<String>, RemoteError>;

    /// Insert a freshly registered user's profile.
    async fn insert_profile(&self, row: &ProfileRow) -> Result<(), RemoteError>;

    /// All profiles (admin surface).
    async fn list_profiles(&self) -> Result<Vec<ProfileRow>, RemoteError>;

    // =========================================================================
    // products
    // =========================================================================

    /// All product variant rows.
    async fn list_products(&self) -> Result<Vec<ProductRow>, RemoteError>;

    /// Create a product variant row.
    async fn insert_product(&self, product: &NewProduct) -> Result<ProductRow, RemoteError>;

    /// Replace a product variant row.
    async fn update_product(&self, id: ProductId, product: &NewProduct)
    -> Result<(), RemoteError>;

    /// Delete a product variant row.
    async fn delete_product(&self, id: ProductId) -> Result<(), RemoteError>;

    // =========================================================================
    // cart
    // =========================================================================

    /// All cart rows belonging to a user.
    async fn cart_rows(&self, user_id: UserId) -> Result<Vec<CartRow>, RemoteError>;

    /// Upsert a cart row; the service merges on conflict and returns the
    /// stored row (with its service-assigned id).
    async fn upsert_cart_row(&self, row: &NewCartRow) -> Result<CartRow, RemoteError>;

    /// Update the quantity of a cart row, scoped by row id AND owning user.
    async fn update_cart_quantity(
        &self,
        id: CartItemId,
        user_id: UserId,
        quantity: i32,
    ) -> Result<(), RemoteError>;

    /// Delete a cart row, scoped by row id AND owning user.
    async fn delete_cart_row(&self, id: CartItemId, user_id: UserId) -> Result<(), RemoteError>;

    /// Delete every cart row belonging to a user.
    async fn clear_cart(&self, user_id: UserId) -> Result<(), RemoteError>;

    // =========================================================================
    // orders
    // =========================================================================

    /// Insert order rows (one per ordered line).
    async fn insert_orders(&self, rows: &[OrderRow]) -> Result<(), RemoteError>;

    /// All order rows (admin surface).
    async fn list_orders(&self) -> Result<Vec<OrderRow>, RemoteError>;
}
