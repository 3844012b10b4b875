//! Checkout: order placement, the online-payment handoff, and postal
//! prefill.
//!
//! Cash-on-delivery orders are placed immediately. Online payment defers
//! through the external redirect widget: the draft is parked as the single
//! pending payment, the widget gets a [`PaymentIntent`], and the provider's
//! success callback places the parked order exactly once.
//!
//! Order placement failure leaves the cart unmodified. The inverse does not
//! hold: once the order rows are in, a failing cart cleanup is logged and
//! does not block the success report.

use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use greengrocer_core::ProductId;

use crate::config::PaymentConfig;
use crate::error::ValidationError;
use crate::remote::types::{OrderRow, ShippingInfo};
use crate::remote::{PostalClient, PostalPlace, RemoteError, RemoteStore};

use super::cart::{CartItem, CartService};
use super::session::SessionService;

/// Payment method labels stored on order rows.
const COD_LABEL: &str = "Cash on Delivery";
const ONLINE_LABEL: &str = "Online Payment";

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout requires an authenticated user.
    #[error("not signed in")]
    NotSignedIn,

    /// Rejected before any remote call.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// No parked payment to complete.
    #[error("no pending payment")]
    NoPendingPayment,

    /// Order total does not fit the provider's minor-unit integer.
    #[error("order total out of range")]
    AmountOverflow,

    /// Hosted backend failure.
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "cod")]
    CashOnDelivery,
    #[serde(rename = "online")]
    Online,
}

/// One line of an order being placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub weight: String,
    pub price: Decimal,
    pub quantity: i32,
}

/// What checkout carries: the full cart, or a single buy-now line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub lines: Vec<OrderLine>,
}

impl OrderDraft {
    /// Draft covering the whole cart.
    #[must_use]
    pub fn from_cart(items: &[CartItem]) -> Self {
        Self {
            lines: items
                .iter()
                .map(|i| OrderLine {
                    product_id: i.product_id,
                    name: i.name.clone(),
                    weight: i.weight.clone(),
                    price: i.price,
                    quantity: i.quantity,
                })
                .collect(),
        }
    }

    /// Draft for a single buy-now line.
    #[must_use]
    pub fn single(line: OrderLine) -> Self {
        Self { lines: vec![line] }
    }

    fn subtotal(&self) -> Decimal {
        self.lines
            .iter()
            .map(|l| l.price * Decimal::from(l.quantity))
            .sum()
    }
}

/// What the external payment widget needs to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntent {
    /// Total in minor units (e.g. paise).
    pub amount_minor: i64,
    pub currency: String,
    /// Public key id of the provider account.
    pub key_id: String,
}

/// Result of `place_order`.
#[derive(Debug)]
pub enum PlaceOrderOutcome {
    /// Order rows are in; cart cleanup attempted.
    Placed,
    /// Draft parked; open the widget with this intent.
    PaymentRequired(PaymentIntent),
}

struct PendingPayment {
    draft: OrderDraft,
    shipping: ShippingInfo,
}

/// Places orders against the remote store.
pub struct CheckoutService {
    session: Arc<SessionService>,
    store: Arc<dyn RemoteStore>,
    cart: Arc<CartService>,
    postal: PostalClient,
    payment: PaymentConfig,
    delivery_fee: Decimal,
    pending: Mutex<Option<PendingPayment>>,
}

impl CheckoutService {
    /// Create a new checkout service.
    #[must_use]
    pub fn new(
        session: Arc<SessionService>,
        store: Arc<dyn RemoteStore>,
        cart: Arc<CartService>,
        postal: PostalClient,
        payment: PaymentConfig,
        delivery_fee: Decimal,
    ) -> Self {
        Self {
            session,
            store,
            cart,
            postal,
            payment,
            delivery_fee,
            pending: Mutex::new(None),
        }
    }

    /// Resolve a 6-digit postal code to a city/state prefill.
    ///
    /// Lookup failure is non-fatal and yields `None`; only a malformed code
    /// is an error.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPostalCode` for codes that are not
    /// exactly 6 digits.
    pub async fn pincode_lookup(&self, code: &str) -> Result<Option<PostalPlace>, ValidationError> {
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidPostalCode(code.to_owned()));
        }

        Ok(self.postal.lookup(code).await)
    }

    /// Subtotal plus the flat delivery fee.
    #[must_use]
    pub fn total(&self, draft: &OrderDraft) -> Decimal {
        draft.subtotal() + self.delivery_fee
    }

    /// Place an order.
    ///
    /// Cash-on-delivery submits immediately. Online parks the draft and
    /// returns the [`PaymentIntent`] for the external widget; a second
    /// online attempt overwrites the parked draft.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without an identity, `Validation` for an empty
    /// draft or missing shipping fields, `AmountOverflow`, or `Remote` when
    /// the order insert fails (the cart is left untouched in that case).
    #[instrument(skip(self, draft, shipping), fields(lines = draft.lines.len(), method = ?method))]
    pub async fn place_order(
        &self,
        draft: OrderDraft,
        shipping: ShippingInfo,
        method: PaymentMethod,
    ) -> Result<PlaceOrderOutcome, CheckoutError> {
        if self.session.identity().is_none() {
            return Err(CheckoutError::NotSignedIn);
        }
        if draft.lines.is_empty() {
            return Err(ValidationError::EmptyOrder.into());
        }
        validate_shipping(&shipping)?;

        match method {
            PaymentMethod::CashOnDelivery => {
                self.submit(&draft, &shipping, COD_LABEL).await?;
                Ok(PlaceOrderOutcome::Placed)
            }
            PaymentMethod::Online => {
                let intent = self.payment_intent(&draft)?;
                *self.pending.lock() = Some(PendingPayment { draft, shipping });
                Ok(PlaceOrderOutcome::PaymentRequired(intent))
            }
        }
    }

    /// The payment widget's success callback: place the parked order.
    ///
    /// The draft is consumed exactly once - a repeated callback finds no
    /// pending payment.
    ///
    /// # Errors
    ///
    /// Returns `NoPendingPayment` when nothing is parked, `NotSignedIn`, or
    /// `Remote` when the order insert fails.
    #[instrument(skip(self))]
    pub async fn complete_payment(&self, provider_ref: &str) -> Result<(), CheckoutError> {
        if self.session.identity().is_none() {
            return Err(CheckoutError::NotSignedIn);
        }

        let pending = self
            .pending
            .lock()
            .take()
            .ok_or(CheckoutError::NoPendingPayment)?;

        tracing::info!(provider_ref, "payment confirmed by provider");
        self.submit(&pending.draft, &pending.shipping, ONLINE_LABEL)
            .await?;
        Ok(())
    }

    fn payment_intent(&self, draft: &OrderDraft) -> Result<PaymentIntent, CheckoutError> {
        let minor = (self.total(draft) * Decimal::ONE_HUNDRED).round();

        Ok(PaymentIntent {
            amount_minor: minor.to_i64().ok_or(CheckoutError::AmountOverflow)?,
            currency: self.payment.currency.clone(),
            key_id: self.payment.key_id.clone(),
        })
    }

    async fn submit(
        &self,
        draft: &OrderDraft,
        shipping: &ShippingInfo,
        method_label: &str,
    ) -> Result<(), CheckoutError> {
        let Some(user) = self.session.identity() else {
            return Err(CheckoutError::NotSignedIn);
        };

        let rows: Vec<OrderRow> = draft
            .lines
            .iter()
            .map(|line| OrderRow {
                user_id: user.id,
                product_id: line.product_id,
                name: line.name.clone(),
                weight: line.weight.clone(),
                price: line.price,
                quantity: line.quantity,
                shipping_info: shipping.clone(),
                payment_method: method_label.to_owned(),
            })
            .collect();

        self.store.insert_orders(&rows).await?;
        tracing::info!(lines = rows.len(), method_label, "order placed");

        // Order success is independent of cart cleanup success.
        if let Err(e) = self.cart.clear().await {
            tracing::warn!(error = %e, "cart cleanup failed after order placement");
        }

        Ok(())
    }
}

fn validate_shipping(shipping: &ShippingInfo) -> Result<(), ValidationError> {
    let required: [(&'static str, &str); 5] = [
        ("full_name", &shipping.full_name),
        ("email", &shipping.email),
        ("phone", &shipping.phone),
        ("address", &shipping.address),
        ("postal_code", &shipping.postal_code),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(field));
        }
    }
    Ok(())
}
