//! SDK configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use keyward_auth::VerifierOptions;

pub const ENV_API_URL: &str = "KEYWARD_API_URL";
pub const ENV_JWKS_URL: &str = "KEYWARD_JWKS_URL";
pub const ENV_TENANT_UUID: &str = "KEYWARD_TENANT_UUID";
pub const ENV_CUSTOMER_UUID: &str = "KEYWARD_CUSTOMER_UUID";
pub const ENV_TRUST_MODE: &str = "KEYWARD_TRUST_MODE";
pub const ENV_CACHE_TTL_SECONDS: &str = "KEYWARD_CACHE_TTL_SECONDS";

pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 900;

fn default_cache_ttl_seconds() -> u64 {
    DEFAULT_CACHE_TTL_SECONDS
}

/// Where the identity service lives and how strictly to trust its tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkConfig {
    /// Base URL of the identity service API.
    pub api_url: String,

    /// URL of the published JSON Web Key Set.
    pub jwks_url: String,

    /// Sent as `X-Tenant-Uuid` when set.
    #[serde(default)]
    pub tenant_uuid: Option<String>,

    /// Sent as `X-Customer-Uuid` when set.
    #[serde(default)]
    pub customer_uuid: Option<String>,

    /// SECURITY: skip signature verification. Development only.
    #[serde(default)]
    pub trust_mode: bool,

    /// TTL of both the key-set cache and the user-detail snapshot.
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
}

impl SdkConfig {
    pub fn new(api_url: impl Into<String>, jwks_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            jwks_url: jwks_url.into(),
            tenant_uuid: None,
            customer_uuid: None,
            trust_mode: false,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }

    pub fn with_tenant_uuid(mut self, tenant_uuid: impl Into<String>) -> Self {
        self.tenant_uuid = Some(tenant_uuid.into());
        self
    }

    pub fn with_customer_uuid(mut self, customer_uuid: impl Into<String>) -> Self {
        self.customer_uuid = Some(customer_uuid.into());
        self
    }

    pub fn verifier_options(&self) -> VerifierOptions {
        VerifierOptions {
            trust_mode: self.trust_mode,
            cache_ttl_seconds: self.cache_ttl_seconds,
        }
    }

    /// Read the configuration from `KEYWARD_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String> {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("{name} must be set"))
        };
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let trust_mode = match optional(ENV_TRUST_MODE) {
            Some(raw) => parse_flag(&raw).with_context(|| format!("{ENV_TRUST_MODE} is not a boolean: '{raw}'"))?,
            None => false,
        };

        let cache_ttl_seconds = match optional(ENV_CACHE_TTL_SECONDS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_CACHE_TTL_SECONDS} is not a number of seconds: '{raw}'"))?,
            None => DEFAULT_CACHE_TTL_SECONDS,
        };

        Ok(Self {
            api_url: required(ENV_API_URL)?,
            jwks_url: required(ENV_JWKS_URL)?,
            tenant_uuid: optional(ENV_TENANT_UUID),
            customer_uuid: optional(ENV_CUSTOMER_UUID),
            trust_mode,
            cache_ttl_seconds,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
