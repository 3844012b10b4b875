//! Authentication route handlers.
//!
//! Login accepts an email or mobile number as the identifier. A successful
//! login also replays any guest action captured by the gate, reporting a
//! buy-now draft back to the client so it can continue to checkout.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use greengrocer_core::UserId;

use crate::error::Result;
use crate::services::checkout::OrderDraft;
use crate::services::guest::GateOutcome;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub email: String,
    /// Present when the captured guest action was a buy-now: the client
    /// should continue to checkout with this draft.
    pub resumed_checkout: Option<OrderDraft>,
}

/// Sign in and replay any captured guest action.
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let identity = state
        .session()
        .sign_in(&request.identifier, &request.password)
        .await?;

    // A failing replay must not undo the login itself.
    let resumed_checkout = match state.guest().resume_after_login().await {
        Ok(GateOutcome::Checkout(draft)) => Some(draft),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "guest action replay failed after login");
            None
        }
    };

    Ok(Json(LoginResponse {
        user_id: identity.id,
        email: identity.email.into_inner(),
        resumed_checkout,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    pub password: String,
}

/// Create an account. The user signs in explicitly afterwards.
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<StatusCode> {
    state
        .session()
        .register(
            &request.name,
            &request.email,
            &request.mobile,
            &request.password,
        )
        .await?;
    Ok(StatusCode::CREATED)
}

/// Sign out.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<StatusCode> {
    state.session().sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The login modal was dismissed: discard any captured guest action.
#[instrument(skip(state))]
pub async fn dismiss(State(state): State<AppState>) -> StatusCode {
    state.guest().dismiss();
    StatusCode::NO_CONTENT
}

#[derive(Serialize)]
pub struct ProfileView {
    pub name: String,
    pub mobile: Option<String>,
    pub is_admin: bool,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: Option<UserId>,
    pub email: Option<String>,
    /// May lag behind the identity; absent is a legal transient state.
    pub profile: Option<ProfileView>,
}

/// Current identity and profile.
pub async fn me(State(state): State<AppState>) -> Json<MeResponse> {
    let identity = state.session().identity();
    let profile = state.session().profile().map(|p| ProfileView {
        name: p.name,
        mobile: p.mobile,
        is_admin: p.is_admin,
    });

    Json(MeResponse {
        user_id: identity.as_ref().map(|i| i.id),
        email: identity.map(|i| i.email.into_inner()),
        profile,
    })
}
