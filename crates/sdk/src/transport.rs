//! HTTP adapter for the identity service.
//!
//! [`HttpLoginService`] speaks the identity service's JSON API over any
//! [`HttpClient`]. It implements both [`LoginService`] and [`KeyProvider`],
//! so one instance backs the whole engine.

use std::sync::{Arc, PoisonError, RwLock};

use jsonwebtoken::jwk::Jwk;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use keyward_auth::{KeyProvider, TransportError, UserDetails, VerificationKey, verification_keys};

use crate::config::SdkConfig;
use crate::service::{LoginService, TokenPair};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON text.
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Minimal blocking HTTP capability.
///
/// Timeouts and connection failures are the implementation's business and
/// surface as [`TransportError::Network`].
pub trait HttpClient: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

pub struct HttpLoginService {
    client: Arc<dyn HttpClient>,
    api_url: String,
    jwks_url: String,
    customer_uuid: Option<String>,
    tenant_uuid: RwLock<Option<String>>,
}

impl HttpLoginService {
    pub fn new(config: &SdkConfig, client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            jwks_url: config.jwks_url.clone(),
            customer_uuid: config.customer_uuid.clone(),
            tenant_uuid: RwLock::new(config.tenant_uuid.clone()),
        }
    }

    pub fn tenant_uuid(&self) -> Option<String> {
        self.tenant_uuid
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn request(&self, method: HttpMethod, url: String, bearer: Option<&str>, body: Option<String>) -> HttpRequest {
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        if let Some(customer) = &self.customer_uuid {
            headers.push(("X-Customer-Uuid".to_string(), customer.clone()));
        }
        if let Some(tenant) = self.tenant_uuid() {
            headers.push(("X-Tenant-Uuid".to_string(), tenant));
        }
        if let Some(token) = bearer {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }

    /// Send and require a 200.
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = request.method;
        let url = request.url.clone();
        let response = self.client.send(request)?;

        if response.status != 200 {
            tracing::warn!(?method, %url, status = response.status, "identity service request failed");
            return Err(TransportError::Api {
                status: response.status,
                body: response.body,
            });
        }

        tracing::debug!(?method, %url, "identity service request succeeded");
        Ok(response)
    }

    fn execute_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, TransportError> {
        let response = self.execute(request)?;
        serde_json::from_str(&response.body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, TransportError> {
        let body = serde_json::to_string(body).map_err(|e| TransportError::Decode(e.to_string()))?;
        let request = self.request(HttpMethod::Post, self.endpoint(path), None, Some(body));
        self.execute_json(request)
    }
}

impl LoginService for HttpLoginService {
    fn login(&self, email: &str, password: &str) -> Result<TokenPair, TransportError> {
        self.post_json("/login?plainRefresh=true", &json!({"email": email, "password": password}))
    }

    fn refresh(&self, refresh_token: &str) -> Result<TokenPair, TransportError> {
        self.post_json("/refresh?plainRefresh=true", &json!({"refreshToken": refresh_token}))
    }

    fn fetch_user_details(&self, token: &str) -> Result<UserDetails, TransportError> {
        let request = self.request(HttpMethod::Get, self.endpoint("/me"), Some(token), None);
        self.execute_json(request)
    }

    fn logout(&self, token: &str) -> Result<(), TransportError> {
        let request = self.request(HttpMethod::Post, self.endpoint("/logout"), Some(token), None);
        self.execute(request).map(|_| ())
    }

    fn set_tenant_uuid(&self, tenant_uuid: &str) {
        *self.tenant_uuid.write().unwrap_or_else(PoisonError::into_inner) = Some(tenant_uuid.to_string());
    }
}

/// A published key set whose members are parsed one at a time.
#[derive(Debug, Deserialize)]
struct PublishedKeySet {
    keys: Vec<Value>,
}

impl KeyProvider for HttpLoginService {
    fn fetch_key_set(&self) -> Result<Vec<VerificationKey>, TransportError> {
        let request = self.request(HttpMethod::Get, self.jwks_url.clone(), None, None);
        let published: PublishedKeySet = self.execute_json(request)?;

        let jwks = published
            .keys
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<Jwk>(raw) {
                Ok(jwk) => Some(jwk),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unparseable published key");
                    None
                }
            })
            .collect();
        Ok(verification_keys(jwks))
    }
}

impl core::fmt::Debug for HttpLoginService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpLoginService")
            .field("api_url", &self.api_url)
            .field("jwks_url", &self.jwks_url)
            .field("customer_uuid", &self.customer_uuid)
            .field("tenant_uuid", &self.tenant_uuid())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// reqwest
// ─────────────────────────────────────────────────────────────────────────────

/// [`HttpClient`] backed by a blocking `reqwest` client.
#[cfg(feature = "reqwest")]
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    inner: reqwest::blocking::Client,
}

#[cfg(feature = "reqwest")]
impl ReqwestClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(inner: reqwest::blocking::Client) -> Self {
        Self { inner }
    }
}

#[cfg(feature = "reqwest")]
impl HttpClient for ReqwestClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.inner.get(&request.url),
            HttpMethod::Post => self.inner.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder.send().map_err(|e| TransportError::Network(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| TransportError::Decode(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
