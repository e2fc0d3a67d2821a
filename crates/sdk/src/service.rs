use serde::{Deserialize, Serialize};

use keyward_auth::{TransportError, UserDetails};

/// Token pair issued by the identity service on login and refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl core::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenPair")
            .field("token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Credential exchange and profile lookup against the identity service.
///
/// Implementations do the IO; the session engine only sequences calls and
/// treats every error as opaque.
pub trait LoginService: Send + Sync {
    fn login(&self, email: &str, password: &str) -> Result<TokenPair, TransportError>;

    fn refresh(&self, refresh_token: &str) -> Result<TokenPair, TransportError>;

    fn fetch_user_details(&self, token: &str) -> Result<UserDetails, TransportError>;

    fn logout(&self, token: &str) -> Result<(), TransportError>;

    /// Switch the tenant subsequent requests are made for.
    fn set_tenant_uuid(&self, _tenant_uuid: &str) {}
}
