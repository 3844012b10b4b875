//! Product filter state: search string and selected category.
//!
//! Purely local - no remote calls, no failure mode. Lives for the whole
//! process and resets only on explicit request.

use parking_lot::RwLock;
use serde::Serialize;

/// Sentinel category meaning "no filter".
pub const ALL_PRODUCTS: &str = "All Products";

/// The current listing filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub search: String,
    pub category: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: ALL_PRODUCTS.to_owned(),
        }
    }
}

impl FilterState {
    /// Whether a product name passes the filter.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();

        if !self.search.trim().is_empty() && !name.contains(&self.search.trim().to_lowercase()) {
            return false;
        }

        self.category == ALL_PRODUCTS || name.contains(&self.category.to_lowercase())
    }
}

/// Holds the listing filter for the session.
#[derive(Default)]
pub struct FilterService {
    state: RwLock<FilterState>,
}

impl FilterService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_search(&self, text: &str) {
        self.state.write().search = text.to_owned();
    }

    pub fn set_category(&self, label: &str) {
        self.state.write().category = label.to_owned();
    }

    /// Back to "no filter".
    pub fn reset(&self) {
        *self.state.write() = FilterState::default();
    }

    #[must_use]
    pub fn current(&self) -> FilterState {
        self.state.read().clone()
    }
}
