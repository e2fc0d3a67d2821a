//! Token verification: structure, freshness, then signature.
//!
//! Order of checks for every token:
//! 1. structural decode (`MalformedToken`)
//! 2. `exp` against the time source (`TokenExpired`), trust-mode included
//! 3. unless trust-mode: key resolution through the cache, with at most one
//!    refetch per call (`KeyNotFound`), then signature (`InvalidSignature`)

use std::sync::Arc;

use jsonwebtoken::jwk::KeyAlgorithm;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use keyward_core::TimeSource;

use crate::claims::validate_expiry;
use crate::error::{AuthError, AuthResult, TransportError};
use crate::keyset::{KeySetCache, VerificationKey};
use crate::token::{self, DecodedToken, TokenClaims, TokenHeader};

/// Source of the identity service's published verification keys.
pub trait KeyProvider: Send + Sync {
    fn fetch_key_set(&self) -> Result<Vec<VerificationKey>, TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierOptions {
    /// SECURITY: when true, signatures are NOT verified. Expiry still is.
    /// Only for local development against an identity service whose keys
    /// are unavailable.
    pub trust_mode: bool,
    pub cache_ttl_seconds: u64,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            trust_mode: false,
            cache_ttl_seconds: 900,
        }
    }
}

/// Verifies tokens against a cached key set.
pub struct TokenVerifier {
    provider: Arc<dyn KeyProvider>,
    time: Arc<dyn TimeSource>,
    keys: KeySetCache,
    options: VerifierOptions,
}

impl TokenVerifier {
    pub fn new(provider: Arc<dyn KeyProvider>, time: Arc<dyn TimeSource>, options: VerifierOptions) -> Self {
        if options.trust_mode {
            tracing::warn!("trust mode enabled: token signatures will NOT be verified");
        }
        Self {
            provider,
            time,
            keys: KeySetCache::new(),
            options,
        }
    }

    pub fn options(&self) -> VerifierOptions {
        self.options
    }

    pub fn key_cache(&self) -> &KeySetCache {
        &self.keys
    }

    pub fn get_header(&self, token: &str) -> AuthResult<TokenHeader> {
        token::header(token)
    }

    pub fn get_payload(&self, token: &str) -> AuthResult<TokenClaims> {
        token::claims(token)
    }

    /// Succeeds iff `token` is well-formed, unexpired and (outside
    /// trust-mode) signed by a published key.
    pub fn check_valid(&mut self, token: &str) -> AuthResult<()> {
        self.verify(token).map(|_| ())
    }

    /// Same checks as [`check_valid`](Self::check_valid), returning the
    /// decoded token. In trust-mode the claims are decoded but NOT
    /// cryptographically established.
    pub fn get_verified_claims(&mut self, token: &str) -> AuthResult<DecodedToken> {
        self.verify(token)
    }

    fn verify(&mut self, token: &str) -> AuthResult<DecodedToken> {
        let mut decoded = token::parse(token)?;
        validate_expiry(&decoded.claims, self.time.now())?;

        if self.options.trust_mode {
            return Ok(decoded);
        }

        decoded.claims = self.verify_signature(token, &decoded.header)?;
        Ok(decoded)
    }

    fn verify_signature(&mut self, token: &str, header: &TokenHeader) -> AuthResult<TokenClaims> {
        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| AuthError::malformed("header has no kid"))?;
        let alg: Algorithm = header
            .alg
            .parse()
            .map_err(|_| AuthError::invalid_signature(format!("unsupported algorithm '{}'", header.alg)))?;

        let key = self.resolve_key(kid)?;
        if let Some(declared) = key.jwk().common.key_algorithm {
            if signing_algorithm(declared) != Some(alg) {
                return Err(AuthError::invalid_signature(format!(
                    "key '{kid}' is for {declared:?}, token uses {alg:?}"
                )));
            }
        }

        let decoding_key =
            DecodingKey::from_jwk(key.jwk()).map_err(|e| AuthError::invalid_signature(e.to_string()))?;

        // Expiry was already checked against the injected time source.
        let mut validation = Validation::new(alg);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;

        decode::<TokenClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    /// Fresh cache hit, or exactly one refetch.
    fn resolve_key(&mut self, kid: &str) -> AuthResult<VerificationKey> {
        let now = self.time.now();
        if let Some(key) = self.keys.lookup(kid, now) {
            tracing::debug!(kid, "verification key served from cache");
            return Ok(key.clone());
        }

        let fetched = self.provider.fetch_key_set()?;
        tracing::info!(
            kid,
            keys = fetched.len(),
            ttl_seconds = self.options.cache_ttl_seconds,
            "refetched verification key set"
        );

        // Searched without a freshness check so a zero TTL still serves this call.
        self.keys
            .replace(fetched, self.options.cache_ttl_seconds, now)
            .find(kid)
            .cloned()
            .ok_or_else(|| AuthError::KeyNotFound { kid: kid.to_string() })
    }
}

impl core::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("keys", &self.keys)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// The signing algorithm a JWK `alg` names; `None` for encryption algorithms.
fn signing_algorithm(declared: KeyAlgorithm) -> Option<Algorithm> {
    match declared {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}

fn map_jwt_error(error: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::invalid_signature(error.to_string()),
    }
}
