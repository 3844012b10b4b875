//! Checkout route handlers.
//!
//! The online-payment flow is split across two requests: placing the order
//! parks the draft and returns a payment intent for the external widget;
//! the widget's success callback hits `/checkout/complete`, which places
//! the parked order exactly once.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::remote::PostalPlace;
use crate::services::checkout::{
    OrderDraft, OrderLine, PaymentIntent, PaymentMethod, PlaceOrderOutcome,
};
use crate::services::guest::GateOutcome;
use crate::state::AppState;

use crate::remote::types::ShippingInfo;

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    /// Omitted means "order the whole cart".
    pub lines: Option<Vec<OrderLine>>,
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlaceOrderResponse {
    Placed,
    PaymentRequired { payment: PaymentIntent },
}

/// Place an order from the cart or an explicit set of lines.
#[instrument(skip(state, request))]
pub async fn place(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<PlaceOrderResponse>> {
    let draft = match request.lines {
        Some(lines) => OrderDraft { lines },
        None => OrderDraft::from_cart(&state.cart().items()),
    };

    let outcome = state
        .checkout()
        .place_order(draft, request.shipping, request.payment_method)
        .await?;

    Ok(Json(match outcome {
        PlaceOrderOutcome::Placed => PlaceOrderResponse::Placed,
        PlaceOrderOutcome::PaymentRequired(payment) => {
            PlaceOrderResponse::PaymentRequired { payment }
        }
    }))
}

#[derive(Debug, Deserialize)]
pub struct CompletePaymentRequest {
    /// Provider-defined payment reference from the widget's success callback.
    pub provider_ref: String,
}

/// Payment widget success callback.
#[instrument(skip(state, request))]
pub async fn complete(
    State(state): State<AppState>,
    Json(request): Json<CompletePaymentRequest>,
) -> Result<Json<PlaceOrderResponse>> {
    state.checkout().complete_payment(&request.provider_ref).await?;
    Ok(Json(PlaceOrderResponse::Placed))
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuyNowResponse {
    Checkout { draft: OrderDraft },
    LoginRequired,
}

/// Buy a single line immediately, gated on authentication.
#[instrument(skip(state, line))]
pub async fn buy_now(
    State(state): State<AppState>,
    Json(line): Json<OrderLine>,
) -> Json<BuyNowResponse> {
    Json(match state.guest().buy_now(OrderDraft::single(line)) {
        GateOutcome::Checkout(draft) => BuyNowResponse::Checkout { draft },
        _ => BuyNowResponse::LoginRequired,
    })
}

/// City/state prefill for a 6-digit postal code. `null` when the lookup
/// finds nothing - a missing prefill is not an error.
#[instrument(skip(state))]
pub async fn pincode(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Option<PostalPlace>>> {
    let place = state.checkout().pincode_lookup(&code).await?;
    Ok(Json(place))
}
