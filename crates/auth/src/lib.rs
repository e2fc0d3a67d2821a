//! `keyward-auth` — token verification, session state and ability checks.
//!
//! This crate is decoupled from HTTP: key sets arrive through
//! [`KeyProvider`], time through [`keyward_core::TimeSource`].

pub mod ability;
pub mod authorize;
pub mod claims;
pub mod error;
pub mod keyset;
pub mod role;
pub mod session;
pub mod token;
pub mod user;
pub mod verifier;

#[cfg(test)]
mod test_support;

pub use ability::{Ability, WILDCARD_KEY};
pub use authorize::{AuthorizationExplanation, AuthorizationIndex, DenialKind, DenialReason, HolderState};
pub use claims::validate_expiry;
pub use error::{AuthError, AuthErrorKind, AuthResult, TransportError};
pub use keyset::{KeySet, KeySetCache, VerificationKey, verification_keys};
pub use role::Role;
pub use session::{DetailsSnapshot, LoadingGuard, SessionState};
pub use token::{DecodedToken, TokenClaims, TokenHeader};
pub use user::{GrantRecord, User, UserDetails};
pub use verifier::{KeyProvider, TokenVerifier, VerifierOptions};
