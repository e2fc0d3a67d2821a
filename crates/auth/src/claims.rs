use chrono::{DateTime, Utc};

use crate::error::{AuthError, AuthResult};
use crate::token::TokenClaims;

/// Deterministically check token freshness.
///
/// Whole-second comparison against `exp`: a token whose `exp` equals `now`
/// is still valid, one second later it is not. A payload without `exp` is
/// treated as expired.
///
/// Note: this validates the *claims* only. It runs before, and independently
/// of, signature verification, so trust-mode never bypasses it.
pub fn validate_expiry(claims: &TokenClaims, now: DateTime<Utc>) -> AuthResult<()> {
    match claims.exp {
        Some(exp) if exp >= now.timestamp() => Ok(()),
        _ => Err(AuthError::TokenExpired),
    }
}
