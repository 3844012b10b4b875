//! Remote Store Client - the hosted backend boundary.
//!
//! # Architecture
//!
//! All persistence and authentication is delegated to an external hosted
//! service: row-oriented CRUD over named collections (`profiles`, `products`,
//! `cart`, `orders`) plus an authentication sub-API. The service is the
//! source of truth - no local database, no sync.
//!
//! The boundary is the [`RemoteStore`] trait so the state services can be
//! driven against an in-memory double in tests. [`RestStore`] is the
//! production implementation, speaking the service's REST row protocol with
//! `reqwest`.
//!
//! Every call returns `Result<_, RemoteError>`; absence of an error does not
//! guarantee non-empty data.

mod postal;
mod rest;
mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod memory;

pub use postal::{PostalClient, PostalPlace};
pub use rest::RestStore;
pub use store::RemoteStore;

use thiserror::Error;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed (transport-level).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service error: {status} - {message}")]
    Service {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error body, truncated for logging.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service reported success but returned no row where one was
    /// required (e.g. an upsert with a representation preference).
    #[error("missing data: {0}")]
    MissingData(String),

    /// An operation requiring a user session was attempted without one.
    #[error("no active session")]
    Unauthenticated,
}

impl RemoteError {
    /// HTTP status of a service-level error, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}
