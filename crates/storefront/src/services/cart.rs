//! Cart state: a local mirror of the per-user remote cart collection.
//!
//! Every mutation goes remote-first: the local transition is applied only
//! after the paired remote call succeeded, so local state can never claim a
//! write the service rejected. The one deliberate asymmetry is sign-out,
//! where local state clears immediately without a remote call - a logged-out
//! user must not see stale cart data.
//!
//! Operations no-op (Ok, no state change, no remote call) when nobody is
//! signed in; the UI diverts unauthenticated users through the guest gate
//! instead of calling these directly.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use greengrocer_core::{CartItemId, ProductId, UserId};

use crate::error::ValidationError;
use crate::remote::types::{CartRow, NewCartRow};
use crate::remote::{RemoteError, RemoteStore};

use super::session::{Identity, SessionObserver, SessionService};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Rejected before any remote call.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The paired remote mutation failed; local state was left unchanged.
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),
}

/// One line of the cart, mirroring a remote cart row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Remote row id once persisted.
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub weight: String,
    /// Snapshotted at add time, never re-derived from the catalog.
    pub price: Decimal,
    pub quantity: i32,
    pub image_url: Option<String>,
}

impl From<CartRow> for CartItem {
    fn from(row: CartRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            weight: row.weight,
            price: row.price,
            quantity: row.quantity,
            image_url: row.image_url,
        }
    }
}

fn to_row(item: &CartItem, user_id: UserId) -> NewCartRow {
    NewCartRow {
        user_id,
        product_id: item.product_id,
        name: item.name.clone(),
        weight: item.weight.clone(),
        price: item.price,
        quantity: item.quantity,
        image_url: item.image_url.clone(),
    }
}

/// State transitions, applied by [`apply`] after the paired remote call
/// succeeded.
#[derive(Debug, Clone)]
enum CartCommand {
    /// Wholesale replacement from a fetch.
    Set(Vec<CartItem>),
    /// Append (or replace, when the remote merged on conflict) one item.
    Add(CartItem),
    /// Patch one item's quantity.
    SetQuantity { id: CartItemId, quantity: i32 },
    /// Drop one item.
    Remove(CartItemId),
    /// Drop everything.
    Clear,
}

/// The single state-transition function.
fn apply(items: &mut Vec<CartItem>, command: CartCommand) {
    match command {
        CartCommand::Set(next) => *items = next,
        CartCommand::Add(item) => {
            // The remote merges on (user, product, weight) conflict; mirror
            // that by replacing the row with the same id if one exists.
            if let Some(existing) = items.iter_mut().find(|i| i.id == item.id) {
                *existing = item;
            } else {
                items.push(item);
            }
        }
        CartCommand::SetQuantity { id, quantity } => {
            if let Some(item) = items.iter_mut().find(|i| i.id == id) {
                item.quantity = quantity;
            }
        }
        CartCommand::Remove(id) => items.retain(|i| i.id != id),
        CartCommand::Clear => items.clear(),
    }
}

/// Local mirror of the active user's remote cart.
pub struct CartService {
    session: Arc<SessionService>,
    store: Arc<dyn RemoteStore>,
    items: RwLock<Vec<CartItem>>,
}

impl CartService {
    /// Create a new cart service.
    #[must_use]
    pub fn new(session: Arc<SessionService>, store: Arc<dyn RemoteStore>) -> Self {
        Self {
            session,
            store,
            items: RwLock::new(Vec::new()),
        }
    }

    /// Current cart contents.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.items.read().clone()
    }

    /// Sum of price x quantity over the cart.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .read()
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum()
    }

    /// Replace local state wholesale with the remote rows for the active
    /// identity. Invoked on every sign-in via the session observer.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Remote` if the fetch fails; local state is left
    /// unchanged.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<(), CartError> {
        let Some(user) = self.session.identity() else {
            return Ok(());
        };

        let rows = self.store.cart_rows(user.id).await?;
        apply(
            &mut self.items.write(),
            CartCommand::Set(rows.into_iter().map(CartItem::from).collect()),
        );
        Ok(())
    }

    /// Add an item: remote upsert keyed by (user, product, weight), then the
    /// local append with the service-assigned row id.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Remote` on upsert failure; local state is left
    /// unchanged.
    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub async fn add(&self, item: CartItem) -> Result<(), CartError> {
        let Some(user) = self.session.identity() else {
            return Ok(());
        };

        let stored = self.store.upsert_cart_row(&to_row(&item, user.id)).await?;
        apply(&mut self.items.write(), CartCommand::Add(stored.into()));
        Ok(())
    }

    /// Change an item's quantity. Quantities below 1 are rejected before any
    /// remote call; the remote update is scoped by item id and owning user.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` for quantities below 1, or
    /// `CartError::Remote` on update failure.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, id: CartItemId, quantity: i32) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(ValidationError::QuantityUnderflow(quantity).into());
        }

        let Some(user) = self.session.identity() else {
            return Ok(());
        };

        self.store
            .update_cart_quantity(id, user.id, quantity)
            .await?;
        apply(
            &mut self.items.write(),
            CartCommand::SetQuantity { id, quantity },
        );
        Ok(())
    }

    /// Delete one item, scoped by item id and owning user.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Remote` on delete failure.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: CartItemId) -> Result<(), CartError> {
        let Some(user) = self.session.identity() else {
            return Ok(());
        };

        self.store.delete_cart_row(id, user.id).await?;
        apply(&mut self.items.write(), CartCommand::Remove(id));
        Ok(())
    }

    /// Delete every item of the active user, remote-first.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Remote` on failure; local state is left unchanged.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), CartError> {
        let Some(user) = self.session.identity() else {
            return Ok(());
        };

        self.store.clear_cart(user.id).await?;
        apply(&mut self.items.write(), CartCommand::Clear);
        Ok(())
    }

    /// Reset local state without touching the remote collection. Used on
    /// sign-out, where the rows still belong to the (now inactive) user.
    pub fn clear_local(&self) {
        apply(&mut self.items.write(), CartCommand::Clear);
    }
}

#[async_trait]
impl SessionObserver for CartService {
    async fn signed_in(&self, _identity: &Identity) {
        if let Err(e) = self.fetch().await {
            tracing::warn!(error = %e, "cart fetch failed after sign-in");
        }
    }

    async fn signed_out(&self) {
        self.clear_local();
    }
}
