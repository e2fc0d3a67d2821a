//! `keyward-sdk` — embeddable authentication for host applications.
//!
//! [`AuthSdk`] is the entry point. It is built either from explicit
//! collaborators (tests, custom transports) or from an [`SdkConfig`] plus
//! an [`HttpClient`].

pub mod config;
pub mod sdk;
pub mod service;
pub mod transport;

pub use config::SdkConfig;
pub use sdk::AuthSdk;
pub use service::{LoginService, TokenPair};
pub use transport::{HttpClient, HttpLoginService, HttpMethod, HttpRequest, HttpResponse};

#[cfg(feature = "reqwest")]
pub use transport::ReqwestClient;

pub use keyward_auth::{AuthError, AuthErrorKind, AuthResult, TransportError};
