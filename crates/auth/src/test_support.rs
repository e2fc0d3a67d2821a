//! Fixtures shared by the unit tests of this crate.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};

use crate::error::TransportError;
use crate::keyset::VerificationKey;
use crate::token::encode_segment;
use crate::verifier::KeyProvider;

/// HMAC secret whose standard and url-safe base64 encodings coincide.
pub const SIGNING_SECRET: &[u8] = b"keyward-test-signing-secret-0123456789a";
pub const SIGNING_SECRET_B64: &str = "a2V5d2FyZC10ZXN0LXNpZ25pbmctc2VjcmV0LTAxMjM0NTY3ODlh";

pub const OTHER_SECRET: &[u8] = b"keyward-other-signing-secret-9876543210";

pub const NOW: i64 = 1_700_000_000;

pub fn oct_key(kid: &str) -> VerificationKey {
    let jwk: Jwk = serde_json::from_value(json!({
        "kty": "oct",
        "kid": kid,
        "alg": "HS256",
        "k": SIGNING_SECRET_B64,
    }))
    .unwrap();
    VerificationKey::try_from(jwk).unwrap()
}

pub fn sign_with(secret: &[u8], alg: Algorithm, kid: &str, claims: &Value) -> String {
    let mut header = Header::new(alg);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &EncodingKey::from_secret(secret)).unwrap()
}

pub fn sign(kid: &str, claims: &Value) -> String {
    sign_with(SIGNING_SECRET, Algorithm::HS256, kid, claims)
}

/// Structurally valid token carrying a signature nobody can verify.
pub fn unsigned(header: &Value, claims: &Value) -> String {
    format!(
        "{}.{}.Z2FyYmFnZQ",
        encode_segment(&serde_json::to_vec(header).unwrap()),
        encode_segment(&serde_json::to_vec(claims).unwrap())
    )
}

pub fn claims(exp: i64, user: &str, hash: &str) -> Value {
    json!({"exp": exp, "userUuid": user, "detailsHash": hash})
}

/// Key provider double that counts fetches.
#[derive(Debug, Default)]
pub struct CountingKeyProvider {
    keys: Mutex<Vec<VerificationKey>>,
    failure: Mutex<Option<TransportError>>,
    fetches: AtomicUsize,
}

impl CountingKeyProvider {
    pub fn with_keys(keys: Vec<VerificationKey>) -> Self {
        Self {
            keys: Mutex::new(keys),
            ..Self::default()
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            failure: Mutex::new(Some(error)),
            ..Self::default()
        }
    }

    pub fn publish(&self, keys: Vec<VerificationKey>) {
        *self.keys.lock().unwrap() = keys;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl KeyProvider for CountingKeyProvider {
    fn fetch_key_set(&self) -> Result<Vec<VerificationKey>, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.keys.lock().unwrap().clone())
    }
}
