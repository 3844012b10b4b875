//! Wire types for the hosted backend's collections.
//!
//! These mirror the remote rows exactly as the service serializes them.
//! Domain view models (grouped products, cart items) live in the service
//! layer and are built from these.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use greengrocer_core::{CartItemId, ProductId, UserId};

// =============================================================================
// Auth sub-API
// =============================================================================

/// Session issued by the auth sub-API on sign-in / sign-up.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    /// Bearer token for subsequent row access under this user.
    pub access_token: String,
    /// The authenticated user.
    pub user: AuthUser,
}

/// The user record embedded in an [`AuthSession`].
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    /// Opaque user id minted by the auth service.
    pub id: UserId,
    /// Email the account was registered with.
    pub email: String,
}

// =============================================================================
// profiles
// =============================================================================

/// A row of the `profiles` collection, keyed by the auth user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

// =============================================================================
// products
// =============================================================================

/// A row of the `products` collection. One row per weight variant;
/// rows sharing a `name` are one logical product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    /// Weight label ("500", "1", "5", "30"); unit is grams/kilograms by
    /// convention, not type-enforced.
    pub weight: String,
    /// `None` means "not available".
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
}

/// Payload for creating or replacing a product row (id is service-assigned).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub weight: String,
    pub price: Decimal,
    pub image_url: String,
}

// =============================================================================
// cart
// =============================================================================

/// A row of the per-user `cart` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartRow {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub name: String,
    pub weight: String,
    /// Price snapshotted at add time, never re-derived from the catalog.
    pub price: Decimal,
    pub quantity: i32,
    pub image_url: Option<String>,
}

/// Upsert payload for the `cart` collection (id is service-assigned; the
/// service merges on (user, product, weight) conflict, last write wins).
#[derive(Debug, Clone, Serialize)]
pub struct NewCartRow {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub name: String,
    pub weight: String,
    pub price: Decimal,
    pub quantity: i32,
    pub image_url: Option<String>,
}

// =============================================================================
// orders
// =============================================================================

/// Shipping details captured at checkout, stored verbatim on each order row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

/// A row of the `orders` collection: one row per ordered line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRow {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub name: String,
    pub weight: String,
    pub price: Decimal,
    pub quantity: i32,
    pub shipping_info: ShippingInfo,
    pub payment_method: String,
}
