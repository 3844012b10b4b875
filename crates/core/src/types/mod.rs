//! Core types for Greengrocer.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod login;

pub use email::{Email, EmailError};
pub use id::*;
pub use login::LoginId;
