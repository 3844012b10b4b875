//! Cart route handlers.
//!
//! Add-to-cart runs through the guest gate so an unauthenticated visitor
//! gets a `login_required` response (and a captured action) instead of a
//! silent no-op. The remaining operations hit the cart service directly;
//! they no-op safely without an identity.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use greengrocer_core::{CartItemId, ProductId};

use crate::error::Result;
use crate::services::cart::CartItem;
use crate::services::guest::GateOutcome;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
}

/// Cart contents and subtotal.
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    Json(CartView {
        items: state.cart().items(),
        subtotal: state.cart().subtotal(),
    })
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub name: String,
    pub weight: String,
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AddItemResponse {
    Added { cart: CartView },
    LoginRequired,
}

/// Add an item, gated on authentication.
#[instrument(skip(state, request), fields(product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<AddItemResponse>> {
    let item = CartItem {
        // Placeholder until the remote row id comes back from the upsert.
        id: CartItemId::new(0),
        product_id: request.product_id,
        name: request.name,
        weight: request.weight,
        price: request.price,
        quantity: request.quantity,
        image_url: request.image_url,
    };

    let response = match state.guest().add_to_cart(item).await? {
        GateOutcome::LoginRequired => AddItemResponse::LoginRequired,
        _ => AddItemResponse::Added {
            cart: CartView {
                items: state.cart().items(),
                subtotal: state.cart().subtotal(),
            },
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

/// Change an item's quantity.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CartItemId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    state.cart().update_quantity(id, request.quantity).await?;
    Ok(Json(CartView {
        items: state.cart().items(),
        subtotal: state.cart().subtotal(),
    }))
}

/// Remove one item.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<CartItemId>,
) -> Result<Json<CartView>> {
    state.cart().remove(id).await?;
    Ok(Json(CartView {
        items: state.cart().items(),
        subtotal: state.cart().subtotal(),
    }))
}

/// Clear the whole cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Result<StatusCode> {
    state.cart().clear().await?;
    Ok(StatusCode::NO_CONTENT)
}
