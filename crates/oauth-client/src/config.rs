//! Client configuration
//!
//! Supplied once at construction and never mutated. `redirect_uri` must
//! match the URI registered with the authorization server byte for byte.

use common::Secret;
use serde::{Deserialize, Serialize};
use url::Url;

/// OAuth response type requested on the authorize URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Authorization Code with PKCE
    #[default]
    Code,
    /// Implicit flow, token returned in the redirect
    Token,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Code => "code",
            ResponseType::Token => "token",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub client_id: String,
    pub redirect_uri: Url,
    #[serde(default)]
    pub response_type: ResponseType,
    /// Base URL; endpoints are resolved as fixed paths below it
    pub server_url: Url,
    /// Confidential clients only. Never read from the config file itself.
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Revoke the refresh token before the server-side logout call
    #[serde(default)]
    pub revoke_on_logout: bool,
}

impl AuthConfig {
    pub fn new(client_id: impl Into<String>, redirect_uri: Url, server_url: Url) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri,
            response_type: ResponseType::default(),
            server_url,
            client_secret: None,
            scope: None,
            revoke_on_logout: false,
        }
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn with_client_secret(mut self, secret: Secret<String>) -> Self {
        self.client_secret = Some(secret);
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_revoke_on_logout(mut self, revoke: bool) -> Self {
        self.revoke_on_logout = revoke;
        self
    }

    /// Resolve an endpoint path against `server_url`.
    ///
    /// `server_url` is treated as a directory even without a trailing slash,
    /// so `https://id.example/oauth` + `token` is `https://id.example/oauth/token`.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let mut base = self.server_url.clone();
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        base.join(path)
    }
}
