//! Product listing and filter route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::services::catalog::GroupedProduct;
use crate::services::filter::FilterState;
use crate::state::AppState;

/// Grouped product listing, narrowed by the current filter.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<GroupedProduct>>> {
    let groups = state.catalog().grouped().await?;
    Ok(Json(groups))
}

/// Current listing filter.
pub async fn get_filter(State(state): State<AppState>) -> Json<FilterState> {
    Json(state.filter().current())
}

#[derive(Debug, Deserialize)]
pub struct FilterUpdate {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// Update the search string and/or selected category.
#[instrument(skip(state))]
pub async fn put_filter(
    State(state): State<AppState>,
    Json(update): Json<FilterUpdate>,
) -> Json<FilterState> {
    if let Some(search) = update.search {
        state.filter().set_search(&search);
    }
    if let Some(category) = update.category {
        state.filter().set_category(&category);
    }
    Json(state.filter().current())
}
