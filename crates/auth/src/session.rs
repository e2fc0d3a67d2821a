//! Session state machine.
//!
//! Two states: unauthenticated (initial) and authenticated. The
//! authenticated state is a single [`Identity`] value, so "authenticated
//! implies a user and a token" holds by construction and both transitions
//! are one assignment.
//!
//! # Invariants
//! - `is_authenticated()` implies `current_user()` and `token()` are `Some`.
//! - `invalidate()` clears user, token, refresh token and detail snapshot
//!   together; no partially cleared state exists.
//! - `is_loading()` is true only while a [`LoadingGuard`] is alive.

use chrono::{DateTime, Utc};

use keyward_core::{UserId, expires_after};

use crate::error::{AuthError, AuthResult};
use crate::token::TokenClaims;
use crate::user::User;

/// The user profile as last fetched, with the version hash it was fetched
/// under and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsSnapshot {
    user: User,
    hash: Option<String>,
    set_at: DateTime<Utc>,
}

impl DetailsSnapshot {
    pub fn new(user: User, hash: Option<String>, set_at: DateTime<Utc>) -> Self {
        Self { user, hash, set_at }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn set_at(&self) -> DateTime<Utc> {
        self.set_at
    }

    pub fn into_user(self) -> User {
        self.user
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl_seconds: u64) -> bool {
        now >= expires_after(self.set_at, ttl_seconds)
    }

    /// Whether a token with `claims` needs a fresh profile rather than this
    /// snapshot: expired, different subject, or different hash. A missing
    /// hash on either side never matches.
    pub fn needs_refetch(&self, claims: &TokenClaims, now: DateTime<Utc>, ttl_seconds: u64) -> bool {
        if self.is_expired(now, ttl_seconds) {
            return true;
        }

        let same_subject = claims
            .user_uuid
            .as_deref()
            .and_then(|raw| raw.parse::<UserId>().ok())
            .is_some_and(|id| id == self.user.id());
        let same_hash = matches!(
            (self.hash.as_deref(), claims.details_hash.as_deref()),
            (Some(cached), Some(candidate)) if cached == candidate
        );

        !(same_subject && same_hash)
    }
}

/// Everything that exists only while authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Identity {
    snapshot: DetailsSnapshot,
    token: String,
    refresh_token: Option<String>,
}

/// Mutable record of who is logged in.
///
/// Owned by the session orchestrator; components that only read it
/// (authorization) borrow it.
#[derive(Debug, Clone)]
pub struct SessionState {
    identity: Option<Identity>,
    is_loading: bool,
    cache_ttl_seconds: u64,
}

impl SessionState {
    pub fn new(cache_ttl_seconds: u64) -> Self {
        Self {
            identity: None,
            is_loading: false,
            cache_ttl_seconds,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn current_user(&self) -> Option<&User> {
        self.identity.as_ref().map(|identity| identity.snapshot.user())
    }

    pub fn token(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.token.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.identity.as_ref()?.refresh_token.as_deref()
    }

    pub fn details_hash(&self) -> Option<&str> {
        self.identity.as_ref()?.snapshot.hash()
    }

    pub fn details_set_at(&self) -> Option<DateTime<Utc>> {
        self.identity.as_ref().map(|identity| identity.snapshot.set_at())
    }

    pub fn details_snapshot(&self) -> Option<&DetailsSnapshot> {
        self.identity.as_ref().map(|identity| &identity.snapshot)
    }

    pub fn cache_ttl_seconds(&self) -> u64 {
        self.cache_ttl_seconds
    }

    /// `None` if no snapshot is held, otherwise whether its TTL has run out.
    pub fn is_cache_expired(&self, now: DateTime<Utc>) -> Option<bool> {
        self.details_snapshot()
            .map(|snapshot| snapshot.is_expired(now, self.cache_ttl_seconds))
    }

    /// True if there is no current user, the snapshot expired, or the
    /// token's subject/hash differ from the snapshot.
    pub fn should_fetch_details(&self, claims: &TokenClaims, now: DateTime<Utc>) -> bool {
        match self.details_snapshot() {
            Some(snapshot) => snapshot.needs_refetch(claims, now, self.cache_ttl_seconds),
            None => true,
        }
    }

    /// Unauthenticated → authenticated (or authenticated → authenticated
    /// with every identity field replaced).
    ///
    /// Refuses an empty token; state is unchanged on error.
    pub fn authenticate(
        &mut self,
        snapshot: DetailsSnapshot,
        token: String,
        refresh_token: Option<String>,
    ) -> AuthResult<()> {
        if token.is_empty() {
            return Err(AuthError::malformed("refusing to authenticate with an empty token"));
        }

        tracing::debug!(user_id = %snapshot.user().id(), "session authenticated");
        self.identity = Some(Identity {
            snapshot,
            token,
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
        });
        Ok(())
    }

    /// Authenticated → unauthenticated. Returns the retired detail snapshot,
    /// if any, so a following authentication can decide whether it is
    /// still usable.
    pub fn invalidate(&mut self) -> Option<DetailsSnapshot> {
        let retired = self.identity.take()?;
        tracing::debug!(user_id = %retired.snapshot.user().id(), "session invalidated");
        Some(retired.snapshot)
    }

    /// Mark a network-backed operation as in flight until the guard drops.
    pub fn begin_loading(&mut self) -> LoadingGuard<'_> {
        self.is_loading = true;
        LoadingGuard { state: self }
    }
}

/// Resets `is_loading` on drop, whichever way the operation exits.
///
/// Transitions made while loading go through the guard.
#[derive(Debug)]
pub struct LoadingGuard<'a> {
    state: &'a mut SessionState,
}

impl core::ops::Deref for LoadingGuard<'_> {
    type Target = SessionState;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl core::ops::DerefMut for LoadingGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.is_loading = false;
    }
}
