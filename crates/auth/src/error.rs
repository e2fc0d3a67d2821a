//! Error taxonomy of the session engine.

use thiserror::Error;

/// Result type used across the engine.
pub type AuthResult<T> = Result<T, AuthError>;

/// Failure reported by a collaborator that talks to the outside world.
///
/// The engine never interprets these beyond "the call did not succeed".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),
}

/// Every way a session transition or verification can fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token is not three decodable segments of structured data.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The `exp` claim is in the past.
    #[error("token has expired")]
    TokenExpired,

    /// Cryptographic verification failed, or the key/algorithm did not match.
    #[error("invalid token signature: {0}")]
    InvalidSignature(String),

    /// No verification key with this id, even after refetching the key set.
    #[error("no verification key found for kid '{kid}'")]
    KeyNotFound { kid: String },

    /// `refresh` was called without a refresh token and none is stored.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The user-detail payload could not be turned into a user.
    #[error("invalid user details: {0}")]
    InvalidUserDetails(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Fieldless tag of an [`AuthError`], for callers that only branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    MalformedToken,
    TokenExpired,
    InvalidSignature,
    KeyNotFound,
    MissingRefreshToken,
    InvalidUserDetails,
    Transport,
}

impl AuthError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedToken(msg.into())
    }

    pub fn invalid_signature(msg: impl Into<String>) -> Self {
        Self::InvalidSignature(msg.into())
    }

    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::MalformedToken(_) => AuthErrorKind::MalformedToken,
            AuthError::TokenExpired => AuthErrorKind::TokenExpired,
            AuthError::InvalidSignature(_) => AuthErrorKind::InvalidSignature,
            AuthError::KeyNotFound { .. } => AuthErrorKind::KeyNotFound,
            AuthError::MissingRefreshToken => AuthErrorKind::MissingRefreshToken,
            AuthError::InvalidUserDetails(_) => AuthErrorKind::InvalidUserDetails,
            AuthError::Transport(_) => AuthErrorKind::Transport,
        }
    }
}
