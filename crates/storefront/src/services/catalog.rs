//! Product catalog grouping.
//!
//! The catalog is stored flat - one row per weight variant. The storefront
//! shows one card per product name with a weight selector, so the rows are
//! grouped into [`GroupedProduct`] view models on every fetch. Grouping is
//! pure and stable: first occurrence of a name fixes the group's position
//! and representative image; variants keep input order. Variants are NOT
//! sorted by weight or price (matches the upstream data entry order).

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use greengrocer_core::ProductId;

use crate::remote::types::ProductRow;
use crate::remote::{RemoteError, RemoteStore};

use super::filter::FilterService;

/// A malformed catalog row. Such rows are skipped with a warning rather than
/// crashing the grouping pass.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    /// The row has no usable name to group under.
    #[error("product row {id} has no name")]
    MissingName {
        /// Offending row.
        id: ProductId,
    },
}

/// One selectable weight/price option of a grouped product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductVariant {
    pub id: ProductId,
    pub weight: String,
    /// `None` means "not available".
    pub price: Option<Decimal>,
}

/// One logical product: all variant rows sharing a name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedProduct {
    pub name: String,
    /// The first-seen variant's image represents the group.
    pub image_url: Option<String>,
    pub variants: Vec<ProductVariant>,
}

fn check_row(row: &ProductRow) -> Result<(), TransformError> {
    if row.name.trim().is_empty() {
        return Err(TransformError::MissingName { id: row.id });
    }
    Ok(())
}

/// Group flat variant rows by product name.
///
/// Deterministic and stable: group order follows first occurrence of each
/// name in the input; variant order within a group follows input order.
/// Idempotent over its own flattened output.
#[must_use]
pub fn group_by_name(rows: Vec<ProductRow>) -> Vec<GroupedProduct> {
    let mut groups: Vec<GroupedProduct> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        if let Err(e) = check_row(&row) {
            tracing::warn!(error = %e, "skipping malformed catalog row");
            continue;
        }

        let variant = ProductVariant {
            id: row.id,
            weight: row.weight,
            price: row.price,
        };

        match index.get(&row.name) {
            Some(&at) => groups[at].variants.push(variant),
            None => {
                index.insert(row.name.clone(), groups.len());
                groups.push(GroupedProduct {
                    name: row.name,
                    image_url: row.image_url,
                    variants: vec![variant],
                });
            }
        }
    }

    groups
}

/// Fetches and groups the catalog for listing views.
pub struct CatalogService {
    store: Arc<dyn RemoteStore>,
    filter: Arc<FilterService>,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, filter: Arc<FilterService>) -> Self {
        Self { store, filter }
    }

    /// The grouped catalog, narrowed by the current filter state.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the product fetch fails.
    #[instrument(skip(self))]
    pub async fn grouped(&self) -> Result<Vec<GroupedProduct>, RemoteError> {
        let rows = self.store.list_products().await?;
        let filter = self.filter.current();

        Ok(group_by_name(
            rows.into_iter().filter(|r| filter.matches(&r.name)).collect(),
        ))
    }
}
