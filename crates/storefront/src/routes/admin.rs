//! Admin route handlers.
//!
//! Authorization happens in the admin service: every operation checks the
//! current profile's admin flag, denying when the profile is absent.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use greengrocer_core::ProductId;

use crate::error::Result;
use crate::remote::types::{NewProduct, ProductRow, ProfileRow};
use crate::services::admin::Overview;
use crate::state::AppState;

/// Dashboard stats.
#[instrument(skip(state))]
pub async fn overview(State(state): State<AppState>) -> Result<Json<Overview>> {
    Ok(Json(state.admin().overview().await?))
}

/// Ungrouped product rows for the management table.
#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductRow>>> {
    Ok(Json(state.admin().list_products().await?))
}

/// Create a product variant row.
#[instrument(skip(state, product))]
pub async fn add_product(
    State(state): State<AppState>,
    Json(product): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductRow>)> {
    let row = state.admin().add_product(product).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// Replace a product variant row.
#[instrument(skip(state, product))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(product): Json<NewProduct>,
) -> Result<StatusCode> {
    state.admin().update_product(id, product).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a product variant row.
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state.admin().delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    /// Case-insensitive name substring.
    pub q: Option<String>,
}

/// User profiles.
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<ProfileRow>>> {
    Ok(Json(state.admin().list_users(query.q.as_deref()).await?))
}
