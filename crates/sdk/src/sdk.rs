//! Session orchestrator.
//!
//! `AuthSdk` drives the session state machine: login, authenticate with an
//! externally issued token, refresh, logout. It sequences the verifier,
//! the [`LoginService`] and the session state, and answers authorization
//! queries from whatever the session currently holds.
//!
//! Failure policy:
//! - `login`/`authenticate` invalidate first, so any failure leaves the
//!   session unauthenticated.
//! - `refresh` leaves the session untouched until the exchange succeeds;
//!   a failure after that invalidates.
//! - `logout` always invalidates, then reports the remote outcome.

use std::sync::Arc;

use keyward_auth::token;
use keyward_auth::{
    AuthError, AuthResult, AuthorizationExplanation, AuthorizationIndex, DetailsSnapshot, KeyProvider,
    SessionState, TokenClaims, TokenVerifier, User, VerifierOptions,
};
use keyward_core::{AbilityId, RoleId, SystemTimeSource, TimeSource};

use crate::config::SdkConfig;
use crate::service::LoginService;
use crate::transport::{HttpClient, HttpLoginService};

pub struct AuthSdk {
    service: Arc<dyn LoginService>,
    verifier: TokenVerifier,
    session: SessionState,
    time: Arc<dyn TimeSource>,
    tenant_uuid: Option<String>,
}

impl AuthSdk {
    /// Assemble the engine from its collaborators.
    pub fn new(
        service: Arc<dyn LoginService>,
        keys: Arc<dyn KeyProvider>,
        time: Arc<dyn TimeSource>,
        options: VerifierOptions,
    ) -> Self {
        Self {
            service,
            verifier: TokenVerifier::new(keys, time.clone(), options),
            session: SessionState::new(options.cache_ttl_seconds),
            time,
            tenant_uuid: None,
        }
    }

    /// Engine talking to the identity service described by `config` over
    /// `client`, on the system clock.
    pub fn from_config(config: &SdkConfig, client: Arc<dyn HttpClient>) -> Self {
        let http = Arc::new(HttpLoginService::new(config, client));
        let mut sdk = Self::new(
            http.clone(),
            http,
            Arc::new(SystemTimeSource),
            config.verifier_options(),
        );
        sdk.tenant_uuid = config.tenant_uuid.clone();
        sdk
    }

    /// [`from_config`](Self::from_config) over a blocking `reqwest` client.
    #[cfg(feature = "reqwest")]
    pub fn connect(config: &SdkConfig) -> Self {
        Self::from_config(config, Arc::new(crate::transport::ReqwestClient::new()))
    }

    pub fn set_tenant_uuid(&mut self, tenant_uuid: &str) {
        tracing::info!(tenant_uuid, "tenant switched");
        self.service.set_tenant_uuid(tenant_uuid);
        self.tenant_uuid = Some(tenant_uuid.to_string());
    }

    pub fn tenant_uuid(&self) -> Option<&str> {
        self.tenant_uuid.as_deref()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Exchange credentials for a session.
    pub fn login(&mut self, email: &str, password: &str) -> AuthResult<()> {
        let mut session = self.session.begin_loading();
        session.invalidate();

        let pair = self.service.login(email, password)?;
        let details = self.service.fetch_user_details(&pair.token)?;
        let user = User::from_details(details)?;

        // Fresh from the identity service; only the hash is read, unverified.
        let hash = token::claims(&pair.token).ok().and_then(|claims| claims.details_hash);
        let snapshot = DetailsSnapshot::new(user, hash, self.time.now());

        tracing::info!(user_id = %snapshot.user().id(), "login succeeded");
        session.authenticate(snapshot, pair.token, pair.refresh_token)
    }

    /// Establish a session from a token issued elsewhere.
    ///
    /// The user profile is refetched unless the previous session's snapshot
    /// belongs to the same user, carries the same details hash and has not
    /// expired.
    pub fn authenticate(&mut self, token: &str) -> AuthResult<()> {
        let mut session = self.session.begin_loading();
        let retired = session.invalidate();

        let decoded = self.verifier.get_verified_claims(token)?;
        let snapshot = resolve_details(
            self.service.as_ref(),
            token,
            &decoded.claims,
            retired,
            self.time.now(),
            session.cache_ttl_seconds(),
        )?;

        tracing::info!(user_id = %snapshot.user().id(), "token authenticated");
        session.authenticate(snapshot, token.to_string(), None)
    }

    /// Exchange a refresh token (the given one, else the stored one) for a
    /// new token pair and re-establish the session with it.
    ///
    /// Fails with [`AuthError::MissingRefreshToken`] before any IO if
    /// neither is available.
    pub fn refresh(&mut self, refresh_token: Option<&str>) -> AuthResult<()> {
        let refresh_token = refresh_token
            .or_else(|| self.session.refresh_token())
            .map(str::to_string)
            .ok_or(AuthError::MissingRefreshToken)?;

        let mut session = self.session.begin_loading();
        let pair = self.service.refresh(&refresh_token)?;

        let cached = session.details_snapshot().cloned();
        let ttl = session.cache_ttl_seconds();
        let resolved = self.verifier.get_verified_claims(&pair.token).and_then(|decoded| {
            resolve_details(
                self.service.as_ref(),
                &pair.token,
                &decoded.claims,
                cached,
                self.time.now(),
                ttl,
            )
        });

        let snapshot = match resolved {
            Ok(snapshot) => snapshot,
            Err(err) => {
                session.invalidate();
                tracing::warn!(error = %err, "refreshed token rejected; session invalidated");
                return Err(err);
            }
        };

        tracing::info!(user_id = %snapshot.user().id(), "session refreshed");
        let next_refresh = pair.refresh_token.or(Some(refresh_token));
        session.authenticate(snapshot, pair.token, next_refresh)
    }

    /// End the session remotely (with the given token, else the stored one)
    /// and locally. Local invalidation happens even if the remote call fails;
    /// the remote error is still returned.
    pub fn logout(&mut self, token: Option<&str>) -> AuthResult<()> {
        let token = token.or_else(|| self.session.token()).map(str::to_string);

        let mut session = self.session.begin_loading();
        let remote = match &token {
            Some(token) => self.service.logout(token),
            None => {
                tracing::debug!("no token to revoke; skipping remote logout");
                Ok(())
            }
        };
        session.invalidate();

        match &remote {
            Ok(()) => tracing::info!("logged out"),
            Err(err) => tracing::warn!(error = %err, "remote logout failed; local session cleared"),
        }
        remote.map_err(AuthError::from)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn authorization(&self) -> AuthorizationIndex<'_> {
        AuthorizationIndex::new(&self.session)
    }

    pub fn can_by_id(&self, ability_id: &AbilityId) -> bool {
        self.authorization().can_by_id(ability_id)
    }

    pub fn can_by_key(&self, key: &str) -> bool {
        self.authorization().can_by_key(key)
    }

    pub fn has_role_key(&self, key: &str) -> bool {
        self.authorization().has_role_key(key)
    }

    pub fn has_role_id(&self, role_id: &RoleId) -> bool {
        self.authorization().has_role_id(role_id)
    }

    pub fn is_admin(&self) -> bool {
        self.authorization().is_admin()
    }

    pub fn explain_ability(&self, key: &str) -> AuthorizationExplanation {
        self.authorization().explain_ability(key)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.current_user()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.session.refresh_token()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Verify `token` without touching the session.
    pub fn check_valid(&mut self, token: &str) -> AuthResult<()> {
        self.verifier.check_valid(token)
    }
}

impl core::fmt::Debug for AuthSdk {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthSdk")
            .field("verifier", &self.verifier)
            .field("is_authenticated", &self.session.is_authenticated())
            .field("tenant_uuid", &self.tenant_uuid)
            .finish_non_exhaustive()
    }
}

/// Reuse `cached` if it still describes the token's subject, otherwise
/// fetch and materialise a fresh profile.
fn resolve_details(
    service: &dyn LoginService,
    token: &str,
    claims: &TokenClaims,
    cached: Option<DetailsSnapshot>,
    now: chrono::DateTime<chrono::Utc>,
    ttl_seconds: u64,
) -> AuthResult<DetailsSnapshot> {
    if let Some(snapshot) = cached.filter(|snapshot| !snapshot.needs_refetch(claims, now, ttl_seconds)) {
        tracing::debug!(user_id = %snapshot.user().id(), "details hash unchanged; skipping detail fetch");
        return Ok(snapshot);
    }

    let details = service.fetch_user_details(token)?;
    let user = User::from_details(details)?;
    Ok(DetailsSnapshot::new(user, claims.details_hash.clone(), now))
}
