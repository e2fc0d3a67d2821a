//! Error model for core primitives.

use thiserror::Error;

/// Failure raised while building a core primitive from untrusted input.
///
/// Engine-level failures (token verification, transport) live in
/// `keyward-auth`; this type only covers values that could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
