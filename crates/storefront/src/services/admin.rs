//! Admin surface: product CRUD, user listing, dashboard stats.
//!
//! Every operation is gated on the current profile's admin flag. An absent
//! profile denies exactly like `is_admin = false` - the flag is never
//! assumed present.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use greengrocer_core::ProductId;

use crate::error::ValidationError;
use crate::remote::types::{NewProduct, ProductRow, ProfileRow};
use crate::remote::{RemoteError, RemoteStore};

use super::session::SessionService;

/// Errors that can occur on the admin surface.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The current user is not an admin (or has no profile at all).
    #[error("admin access required")]
    Forbidden,

    /// Rejected before any remote call.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Hosted backend failure.
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),
}

/// Dashboard stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    /// Sum of price x quantity over all order rows.
    pub total_revenue: Decimal,
    pub users: usize,
    pub products: usize,
    pub orders: usize,
}

/// Admin-gated operations over the remote collections.
pub struct AdminService {
    session: Arc<SessionService>,
    store: Arc<dyn RemoteStore>,
}

impl AdminService {
    /// Create a new admin service.
    #[must_use]
    pub fn new(session: Arc<SessionService>, store: Arc<dyn RemoteStore>) -> Self {
        Self { session, store }
    }

    fn require_admin(&self) -> Result<(), AdminError> {
        if self.session.is_admin() {
            Ok(())
        } else {
            Err(AdminError::Forbidden)
        }
    }

    /// All product variant rows, ungrouped, for the management table.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` or `Remote`.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductRow>, AdminError> {
        self.require_admin()?;
        Ok(self.store.list_products().await?)
    }

    /// Create a product variant row.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden`, `Validation` for empty required
    /// fields, or `Remote`.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn add_product(&self, product: NewProduct) -> Result<ProductRow, AdminError> {
        self.require_admin()?;
        validate_product(&product)?;
        Ok(self.store.insert_product(&product).await?)
    }

    /// Replace a product variant row.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden`, `Validation`, or `Remote`.
    #[instrument(skip(self, product), fields(id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        product: NewProduct,
    ) -> Result<(), AdminError> {
        self.require_admin()?;
        validate_product(&product)?;
        Ok(self.store.update_product(id, &product).await?)
    }

    /// Delete a product variant row.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` or `Remote`.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), AdminError> {
        self.require_admin()?;
        Ok(self.store.delete_product(id).await?)
    }

    /// All user profiles, optionally narrowed by a name substring.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` or `Remote`.
    #[instrument(skip(self))]
    pub async fn list_users(&self, name_filter: Option<&str>) -> Result<Vec<ProfileRow>, AdminError> {
        self.require_admin()?;
        let mut profiles = self.store.list_profiles().await?;

        if let Some(needle) = name_filter.map(str::to_lowercase)
            && !needle.is_empty()
        {
            profiles.retain(|p| p.name.to_lowercase().contains(&needle));
        }
        Ok(profiles)
    }

    /// Dashboard stats over orders, users, and products.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` or `Remote`.
    #[instrument(skip(self))]
    pub async fn overview(&self) -> Result<Overview, AdminError> {
        self.require_admin()?;

        let orders = self.store.list_orders().await?;
        let users = self.store.list_profiles().await?;
        let products = self.store.list_products().await?;

        Ok(Overview {
            total_revenue: orders
                .iter()
                .map(|o| o.price * Decimal::from(o.quantity))
                .sum(),
            users: users.len(),
            products: products.len(),
            orders: orders.len(),
        })
    }
}

fn validate_product(product: &NewProduct) -> Result<(), ValidationError> {
    if product.name.trim().is_empty() {
        return Err(ValidationError::MissingField("name"));
    }
    if product.weight.trim().is_empty() {
        return Err(ValidationError::MissingField("weight"));
    }
    if product.image_url.trim().is_empty() {
        return Err(ValidationError::MissingField("image_url"));
    }
    Ok(())
}
