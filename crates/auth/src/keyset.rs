//! Verification-key cache.
//!
//! Holds at most one key set, replaced wholesale on every refetch. A lookup
//! that cannot be answered from a fresh set is a *miss*, not an error: the
//! verifier decides whether to refetch.

use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::Jwk;
use keyward_core::expires_after;

use crate::error::AuthError;

/// A public key published by the identity service, addressed by `kid`.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationKey {
    kid: String,
    jwk: Jwk,
}

impl VerificationKey {
    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn jwk(&self) -> &Jwk {
        &self.jwk
    }
}

impl TryFrom<Jwk> for VerificationKey {
    type Error = AuthError;

    fn try_from(jwk: Jwk) -> Result<Self, Self::Error> {
        let kid = jwk
            .common
            .key_id
            .clone()
            .filter(|kid| !kid.is_empty())
            .ok_or_else(|| AuthError::malformed("verification key has no kid"))?;
        Ok(Self { kid, jwk })
    }
}

/// One fetched generation of keys.
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: Vec<VerificationKey>,
    fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl KeySet {
    pub fn keys(&self) -> &[VerificationKey] {
        &self.keys
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Scan for `kid`, ignoring freshness.
    pub fn find(&self, kid: &str) -> Option<&VerificationKey> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}

/// Single-slot key-set cache with a TTL.
#[derive(Debug, Clone, Default)]
pub struct KeySetCache {
    current: Option<KeySet>,
}

impl KeySetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if nothing is cached or `now` has reached `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match &self.current {
            Some(set) => now >= set.expires_at,
            None => true,
        }
    }

    /// Answer from a fresh set only; `None` covers both "stale/absent" and
    /// "not in the fresh set".
    pub fn lookup(&self, kid: &str, now: DateTime<Utc>) -> Option<&VerificationKey> {
        if self.is_expired(now) {
            return None;
        }
        self.current.as_ref()?.find(kid)
    }

    /// Replace the cached set.
    pub fn replace(&mut self, keys: Vec<VerificationKey>, ttl_seconds: u64, now: DateTime<Utc>) -> &KeySet {
        self.current.insert(KeySet {
            keys,
            fetched_at: now,
            expires_at: expires_after(now, ttl_seconds),
        })
    }

    pub fn current(&self) -> Option<&KeySet> {
        self.current.as_ref()
    }
}

/// Convert a fetched JWK list. Keys without a `kid` can never be selected by
/// a token header, so they are dropped.
pub fn verification_keys(jwks: Vec<Jwk>) -> Vec<VerificationKey> {
    jwks.into_iter()
        .filter_map(|jwk| match VerificationKey::try_from(jwk) {
            Ok(key) => Some(key),
            Err(err) => {
                tracing::warn!(error = %err, "skipping published key");
                None
            }
        })
        .collect()
}
