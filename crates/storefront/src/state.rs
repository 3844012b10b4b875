//! Application state shared across handlers.

use std::sync::{Arc, Weak};

use crate::config::StorefrontConfig;
use crate::remote::{PostalClient, RemoteStore};
use crate::services::admin::AdminService;
use crate::services::cart::CartService;
use crate::services::catalog::CatalogService;
use crate::services::checkout::CheckoutService;
use crate::services::filter::FilterService;
use crate::services::guest::GuestGate;
use crate::services::session::{SessionObserver, SessionService};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the service graph wired per the
/// dependency direction: cart and guest over session, catalog over filter,
/// checkout over session and cart. The cart subscribes to identity changes
/// here, at construction.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    session: Arc<SessionService>,
    cart: Arc<CartService>,
    filter: Arc<FilterService>,
    catalog: CatalogService,
    guest: GuestGate,
    checkout: CheckoutService,
    admin: AdminService,
}

impl AppState {
    /// Wire the service graph over a remote store client.
    #[must_use]
    pub fn new(config: StorefrontConfig, store: Arc<dyn RemoteStore>) -> Self {
        let session = Arc::new(SessionService::new(store.clone()));
        let cart = Arc::new(CartService::new(session.clone(), store.clone()));
        session.subscribe(Arc::downgrade(&cart) as Weak<dyn SessionObserver>);

        let filter = Arc::new(FilterService::new());
        let catalog = CatalogService::new(store.clone(), filter.clone());
        let guest = GuestGate::new(session.clone(), cart.clone());
        let checkout = CheckoutService::new(
            session.clone(),
            store.clone(),
            cart.clone(),
            PostalClient::new(&config.postal_lookup_url),
            config.payment.clone(),
            config.delivery_fee,
        );
        let admin = AdminService::new(session.clone(), store);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                session,
                cart,
                filter,
                catalog,
                guest,
                checkout,
                admin,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the session service.
    #[must_use]
    pub fn session(&self) -> &SessionService {
        &self.inner.session
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    /// Get a reference to the filter service.
    #[must_use]
    pub fn filter(&self) -> &FilterService {
        &self.inner.filter
    }

    /// Get a reference to the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the guest gate.
    #[must_use]
    pub fn guest(&self) -> &GuestGate {
        &self.inner.guest
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// Get a reference to the admin service.
    #[must_use]
    pub fn admin(&self) -> &AdminService {
        &self.inner.admin
    }
}
