//! Guest checkout handoff.
//!
//! Unauthenticated visitors who hit "add to cart" or "buy now" do not lose
//! the action: it is captured as the single pending action, the login modal
//! is shown, and the action replays exactly once after a successful login.
//! Dismissing the modal discards it. Only one action can be pending - a
//! second trigger while prompting overwrites the first, since only one
//! modal can be open at a time.
//!
//! Guest gating always precedes any remote cart call: while the visitor is
//! unauthenticated, capturing produces zero remote traffic.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::instrument;

use super::cart::{CartError, CartItem, CartService};
use super::checkout::OrderDraft;
use super::session::SessionService;

/// A deferred cart/checkout action awaiting authentication.
#[derive(Debug, Clone)]
pub enum PendingGuestAction {
    AddToCart(CartItem),
    BuyNow(OrderDraft),
}

/// What happened to a gated request.
#[derive(Debug)]
pub enum GateOutcome {
    /// The action ran (or there was nothing to replay).
    Done,
    /// Proceed to checkout with this draft.
    Checkout(OrderDraft),
    /// The action was captured; show the login modal.
    LoginRequired,
}

/// Gates cart/checkout entry points on authentication.
pub struct GuestGate {
    session: Arc<SessionService>,
    cart: Arc<CartService>,
    pending: Mutex<Option<PendingGuestAction>>,
}

impl GuestGate {
    /// Create a new gate.
    #[must_use]
    pub fn new(session: Arc<SessionService>, cart: Arc<CartService>) -> Self {
        Self {
            session,
            cart,
            pending: Mutex::new(None),
        }
    }

    /// Add to cart, or capture the item and ask for a login.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the user is authenticated and the cart add
    /// itself fails.
    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub async fn add_to_cart(&self, item: CartItem) -> Result<GateOutcome, CartError> {
        if self.session.identity().is_none() {
            *self.pending.lock() = Some(PendingGuestAction::AddToCart(item));
            return Ok(GateOutcome::LoginRequired);
        }

        self.cart.add(item).await?;
        Ok(GateOutcome::Done)
    }

    /// Proceed to checkout with a draft, or capture it and ask for a login.
    #[instrument(skip(self, draft), fields(lines = draft.lines.len()))]
    pub fn buy_now(&self, draft: OrderDraft) -> GateOutcome {
        if self.session.identity().is_none() {
            *self.pending.lock() = Some(PendingGuestAction::BuyNow(draft));
            return GateOutcome::LoginRequired;
        }

        GateOutcome::Checkout(draft)
    }

    /// Replay the captured action after a successful login. Consumes it
    /// exactly once; with nothing pending this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the replayed cart add fails. The action is
    /// consumed either way - there is no automatic retry.
    #[instrument(skip(self))]
    pub async fn resume_after_login(&self) -> Result<GateOutcome, CartError> {
        let Some(action) = self.pending.lock().take() else {
            return Ok(GateOutcome::Done);
        };

        match action {
            PendingGuestAction::AddToCart(item) => {
                self.cart.add(item).await?;
                Ok(GateOutcome::Done)
            }
            PendingGuestAction::BuyNow(draft) => Ok(GateOutcome::Checkout(draft)),
        }
    }

    /// The login modal was dismissed without authenticating: discard.
    pub fn dismiss(&self) {
        *self.pending.lock() = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Weak;

    use rust_decimal::Decimal;

    use super::*;
    use crate::remote::memory::{CallRecord, MemoryStore};
    use crate::remote::types::ProfileRow;
    use crate::services::checkout::OrderLine;
    use crate::services::session::SessionObserver;

    use greengrocer_core::{CartItemId, ProductId};

    fn graph() -> (Arc<MemoryStore>, Arc<SessionService>, Arc<CartService>, GuestGate) {
        let store = Arc::new(MemoryStore::new());
        let session = Arc::new(SessionService::new(store.clone()));
        let cart = Arc::new(CartService::new(session.clone(), store.clone()));
        session.subscribe(Arc::downgrade(&cart) as Weak<dyn SessionObserver>);
        let gate = GuestGate::new(session.clone(), cart.clone());

        let user_id = store.seed_user("asha@example.com", "hunter42");
        store.seed_profile(ProfileRow {
            id: user_id,
            name: "Asha".to_owned(),
            email: "asha@example.com".to_owned(),
            mobile: None,
            is_admin: false,
        });

        (store, session, cart, gate)
    }

    fn rice() -> CartItem {
        CartItem {
            id: CartItemId::new(0),
            product_id: ProductId::new(10),
            name: "Rice".to_owned(),
            weight: "500".to_owned(),
            price: Decimal::new(40, 0),
            quantity: 1,
            image_url: None,
        }
    }

    fn rice_draft() -> OrderDraft {
        OrderDraft::single(OrderLine {
            product_id: ProductId::new(10),
            name: "Rice".to_owned(),
            weight: "500".to_owned(),
            price: Decimal::new(40, 0),
            quantity: 1,
        })
    }

    #[tokio::test]
    async fn test_guest_add_captures_action_with_zero_remote_calls() {
        let (store, _session, cart, gate) = graph();

        let outcome = gate.add_to_cart(rice()).await.unwrap();
        assert!(matches!(outcome, GateOutcome::LoginRequired));
        assert!(store.calls().is_empty());
        assert!(cart.items().is_empty());
    }

    #[tokio::test]
    async fn test_login_replays_captured_add_exactly_once() {
        let (store, session, cart, gate) = graph();

        gate.add_to_cart(rice()).await.unwrap();
        session.sign_in("asha@example.com", "hunter42").await.unwrap();

        let outcome = gate.resume_after_login().await.unwrap();
        assert!(matches!(outcome, GateOutcome::Done));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].name, "Rice");

        let upserts = store
            .calls()
            .iter()
            .filter(|c| matches!(c, CallRecord::UpsertCartRow { .. }))
            .count();
        assert_eq!(upserts, 1);

        // A second resume finds nothing to replay.
        let outcome = gate.resume_after_login().await.unwrap();
        assert!(matches!(outcome, GateOutcome::Done));
        assert_eq!(
            store
                .calls()
                .iter()
                .filter(|c| matches!(c, CallRecord::UpsertCartRow { .. }))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_dismiss_discards_the_action() {
        let (store, session, cart, gate) = graph();

        gate.add_to_cart(rice()).await.unwrap();
        gate.dismiss();

        session.sign_in("asha@example.com", "hunter42").await.unwrap();
        gate.resume_after_login().await.unwrap();

        assert!(cart.items().is_empty());
        assert!(
            !store
                .calls()
                .iter()
                .any(|c| matches!(c, CallRecord::UpsertCartRow { .. }))
        );
    }

    #[tokio::test]
    async fn test_second_trigger_overwrites_the_first() {
        let (_store, session, _cart, gate) = graph();

        gate.add_to_cart(rice()).await.unwrap();
        gate.buy_now(rice_draft());

        session.sign_in("asha@example.com", "hunter42").await.unwrap();
        let outcome = gate.resume_after_login().await.unwrap();

        // The later buy-now won; the earlier add was dropped.
        assert!(matches!(outcome, GateOutcome::Checkout(_)));
    }

    #[tokio::test]
    async fn test_authenticated_add_passes_straight_through() {
        let (_store, session, cart, gate) = graph();
        session.sign_in("asha@example.com", "hunter42").await.unwrap();

        let outcome = gate.add_to_cart(rice()).await.unwrap();
        assert!(matches!(outcome, GateOutcome::Done));
        assert_eq!(cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_authenticated_buy_now_returns_checkout() {
        let (_store, session, _cart, gate) = graph();
        session.sign_in("asha@example.com", "hunter42").await.unwrap();

        let outcome = gate.buy_now(rice_draft());
        let GateOutcome::Checkout(draft) = outcome else {
            panic!("expected checkout outcome");
        };
        assert_eq!(draft.lines.len(), 1);
    }
}
