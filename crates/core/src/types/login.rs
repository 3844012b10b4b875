//! Login identifier parsing.
//!
//! Sign-in accepts either an email address or a mobile number in the same
//! input field. Anything containing an `@` is treated as an email; everything
//! else is a mobile number that must be resolved to an email through a
//! profile lookup before credentials are checked.

use crate::types::email::{Email, EmailError};

/// What the user typed into the "email or mobile number" field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginId {
    /// An email address, usable for sign-in directly.
    Email(Email),
    /// A mobile number, to be resolved to an email first.
    Mobile(String),
}

impl LoginId {
    /// Classify and validate a raw login identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, or contains an `@` but is not
    /// a valid email address.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(EmailError::Empty);
        }

        if raw.contains('@') {
            Email::parse(raw).map(Self::Email)
        } else {
            Ok(Self::Mobile(raw.to_owned()))
        }
    }
}
