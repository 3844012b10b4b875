//! Unified error handling.
//!
//! Provides a unified `AppError` type mapping every service-layer error onto
//! an HTTP response. All route handlers return `Result<T, AppError>`. The
//! services themselves never panic across their boundary - every remote-call
//! failure is caught and converted into the typed results below.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::remote::RemoteError;
use crate::services::admin::AdminError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;
use crate::services::session::AuthError;

/// Input validation failures, surfaced before any remote call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required form field was empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A cart quantity below 1 was requested.
    #[error("quantity must be at least 1 (got {0})")]
    QuantityUnderflow(i32),

    /// Checkout was attempted with nothing to order.
    #[error("no items to checkout")]
    EmptyOrder,

    /// A postal code that is not 6 digits.
    #[error("invalid postal code: {0}")]
    InvalidPostalCode(String),
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Hosted backend operation failed.
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Admin operation failed.
    #[error("Admin error: {0}")]
    Admin(#[from] AdminError),

    /// Request input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Remote(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::IdentifierNotFound => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::AlreadyRegistered => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Remote(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Cart(err) => match err {
                CartError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CartError::Remote(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Checkout(err) => match err {
                CheckoutError::NotSignedIn => StatusCode::UNAUTHORIZED,
                CheckoutError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::NoPendingPayment => StatusCode::CONFLICT,
                CheckoutError::AmountOverflow => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::Remote(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Admin(err) => match err {
                AdminError::Forbidden => StatusCode::FORBIDDEN,
                AdminError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AdminError::Remote(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Remote failures are not echoed verbatim.
    fn message(&self) -> String {
        match self {
            Self::Remote(_)
            | Self::Auth(AuthError::Remote(_))
            | Self::Cart(CartError::Remote(_))
            | Self::Checkout(CheckoutError::Remote(_))
            | Self::Admin(AdminError::Remote(_)) => "Remote service error".to_string(),
            Self::Auth(AuthError::InvalidCredentials | AuthError::IdentifierNotFound) => {
                "Invalid credentials".to_string()
            }
            Self::Auth(AuthError::AlreadyRegistered) => {
                "An account with this email already exists".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request error");
        }

        (status, self.message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::Validation(ValidationError::QuantityUnderflow(0));
        assert_eq!(
            err.to_string(),
            "Validation error: quantity must be at least 1 (got 0)"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("x".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::AlreadyRegistered).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Admin(AdminError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Validation(ValidationError::EmptyOrder).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_remote_details_not_exposed() {
        let err = AppError::Remote(RemoteError::Service {
            status: 500,
            message: "secret internals".to_string(),
        });
        assert_eq!(err.message(), "Remote service error");
    }
}
