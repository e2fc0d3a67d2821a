#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};

use keyward_auth::{KeyProvider, TransportError, UserDetails, VerificationKey, VerifierOptions};
use keyward_core::ManualTimeSource;
use keyward_sdk::{AuthSdk, HttpClient, HttpRequest, HttpResponse, LoginService, TokenPair};

pub const NOW: i64 = 1_700_000_000;
pub const TTL: u64 = 900;

/// Standard and url-safe base64 of this secret are identical.
pub const SECRET: &[u8] = b"keyward-test-signing-secret-0123456789a";
pub const SECRET_B64: &str = "a2V5d2FyZC10ZXN0LXNpZ25pbmctc2VjcmV0LTAxMjM0NTY3ODlh";

pub const ALICE: &str = "0195f0c2-7a3e-7d61-9b1e-4c2f8a6d0a01";
pub const BOB: &str = "0195f0c2-7a3e-7d61-9b1e-4c2f8a6d0b01";
pub const READ_POSTS: &str = "0195f0c2-7a3e-7d61-9b1e-4c2f8a6d0c01";
pub const WRITE_POSTS: &str = "0195f0c2-7a3e-7d61-9b1e-4c2f8a6d0c02";
pub const EVERYTHING: &str = "0195f0c2-7a3e-7d61-9b1e-4c2f8a6d0cff";
pub const EDITOR: &str = "0195f0c2-7a3e-7d61-9b1e-4c2f8a6d0d01";

pub fn init_tracing() {
    keyward_observability::tracing::init(keyward_observability::Format::Pretty, "debug");
}

pub fn jwk(kid: &str) -> Value {
    json!({"kty": "oct", "kid": kid, "alg": "HS256", "k": SECRET_B64})
}

pub fn oct_key(kid: &str) -> VerificationKey {
    let jwk: Jwk = serde_json::from_value(jwk(kid)).unwrap();
    VerificationKey::try_from(jwk).unwrap()
}

pub fn mint(kid: &str, exp: i64, user: &str, hash: &str) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    let claims = json!({"exp": exp, "userUuid": user, "detailsHash": hash});
    encode(&header, &claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

pub fn profile(user: &str, abilities: &[(&str, &str)]) -> UserDetails {
    let abilities: Vec<Value> = abilities
        .iter()
        .map(|(uuid, key)| json!({"uuid": uuid, "key": key, "label": key}))
        .collect();
    serde_json::from_value(json!({
        "uuid": user,
        "firstName": "Test",
        "lastName": "User",
        "email": "test@example.com",
        "abilities": abilities,
        "roles": [{"uuid": EDITOR, "key": "editor", "label": "Editor"}],
        "primaryRole": {"uuid": EDITOR, "key": "editor", "label": "Editor"},
        "isAdmin": false
    }))
    .unwrap()
}

pub fn pair(token: &str, refresh: &str) -> TokenPair {
    TokenPair {
        token: token.to_string(),
        refresh_token: Some(refresh.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator doubles
// ─────────────────────────────────────────────────────────────────────────────

/// Scripted identity service that records every call.
#[derive(Debug)]
pub struct FakeLoginService {
    pub login_result: Mutex<Result<TokenPair, TransportError>>,
    pub refresh_result: Mutex<Result<TokenPair, TransportError>>,
    pub details_result: Mutex<Result<UserDetails, TransportError>>,
    pub logout_result: Mutex<Result<(), TransportError>>,

    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub details_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,

    pub refresh_tokens_seen: Mutex<Vec<String>>,
    pub logout_tokens_seen: Mutex<Vec<String>>,
    pub tenants_seen: Mutex<Vec<String>>,
}

impl Default for FakeLoginService {
    fn default() -> Self {
        let unscripted = || TransportError::Network("unscripted call".to_string());
        Self {
            login_result: Mutex::new(Err(unscripted())),
            refresh_result: Mutex::new(Err(unscripted())),
            details_result: Mutex::new(Err(unscripted())),
            logout_result: Mutex::new(Ok(())),
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            details_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            refresh_tokens_seen: Mutex::new(Vec::new()),
            logout_tokens_seen: Mutex::new(Vec::new()),
            tenants_seen: Mutex::new(Vec::new()),
        }
    }
}

impl FakeLoginService {
    pub fn on_login(&self, result: Result<TokenPair, TransportError>) {
        *self.login_result.lock().unwrap() = result;
    }

    pub fn on_refresh(&self, result: Result<TokenPair, TransportError>) {
        *self.refresh_result.lock().unwrap() = result;
    }

    pub fn on_details(&self, result: Result<UserDetails, TransportError>) {
        *self.details_result.lock().unwrap() = result;
    }

    pub fn on_logout(&self, result: Result<(), TransportError>) {
        *self.logout_result.lock().unwrap() = result;
    }

    pub fn details_calls(&self) -> usize {
        self.details_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

impl LoginService for FakeLoginService {
    fn login(&self, _email: &str, _password: &str) -> Result<TokenPair, TransportError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_result.lock().unwrap().clone()
    }

    fn refresh(&self, refresh_token: &str) -> Result<TokenPair, TransportError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_tokens_seen.lock().unwrap().push(refresh_token.to_string());
        self.refresh_result.lock().unwrap().clone()
    }

    fn fetch_user_details(&self, _token: &str) -> Result<UserDetails, TransportError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        self.details_result.lock().unwrap().clone()
    }

    fn logout(&self, token: &str) -> Result<(), TransportError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.logout_tokens_seen.lock().unwrap().push(token.to_string());
        self.logout_result.lock().unwrap().clone()
    }

    fn set_tenant_uuid(&self, tenant_uuid: &str) {
        self.tenants_seen.lock().unwrap().push(tenant_uuid.to_string());
    }
}

/// Key provider publishing a fixed set and counting fetches.
#[derive(Debug)]
pub struct CountingKeys {
    keys: Mutex<Vec<VerificationKey>>,
    fetches: AtomicUsize,
}

impl CountingKeys {
    pub fn new(keys: Vec<VerificationKey>) -> Self {
        Self {
            keys: Mutex::new(keys),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl KeyProvider for CountingKeys {
    fn fetch_key_set(&self) -> Result<Vec<VerificationKey>, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.keys.lock().unwrap().clone())
    }
}

pub struct Harness {
    pub sdk: AuthSdk,
    pub service: Arc<FakeLoginService>,
    pub keys: Arc<CountingKeys>,
    pub time: Arc<ManualTimeSource>,
}

pub fn harness(trust_mode: bool) -> Harness {
    init_tracing();

    let service = Arc::new(FakeLoginService::default());
    let keys = Arc::new(CountingKeys::new(vec![oct_key("k1")]));
    let time = Arc::new(ManualTimeSource::new(NOW));
    let sdk = AuthSdk::new(
        service.clone(),
        keys.clone(),
        time.clone(),
        VerifierOptions {
            trust_mode,
            cache_ttl_seconds: TTL,
        },
    );

    Harness {
        sdk,
        service,
        keys,
        time,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP double
// ─────────────────────────────────────────────────────────────────────────────

/// Replays canned responses in order and records every request.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn respond(&self, status: u16, body: Value) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn respond_raw(&self, status: u16, body: &str) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(&self, error: TransportError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn request(&self, index: usize) -> HttpRequest {
        self.requests.lock().unwrap()[index].clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response".to_string())))
    }
}
