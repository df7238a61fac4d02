//! HTTP façade over the authorization server
//!
//! Covers authorize-URL construction, code exchange, refresh, userinfo,
//! introspection, logout and revocation. Every failure is translated into
//! an [`Error`]: a `{code, message, details?}` body keeps the server's code,
//! anything else falls back to the operation's generic code.
//!
//! The client owns the PKCE verifier and token keys of the credential store:
//! it persists the verifier when building the authorize URL, consumes it on
//! exchange, and writes tokens after exchange or refresh.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{AuthConfig, ResponseType};
use crate::constants::{
    AUTHORIZE_PATH, CODE_CHALLENGE_METHOD, INTROSPECT_PATH, LOGOUT_PATH, REVOKE_PATH, TOKEN_PATH,
    USERINFO_PATH,
};
use crate::credentials::{CredentialStore, StorageKey};
use crate::error::{Error, ErrorCode, Result};
use crate::pkce;
use crate::types::{Introspection, TokenPair, TokenResponse, TokenTypeHint, User};

/// Build the HTTP client used for every server call.
///
/// The cookie store is enabled so session cookies set by the server travel
/// alongside bearer parameters. `timeout` of `None` leaves reqwest's default.
pub fn default_http_client(timeout: Option<Duration>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().cookie_store(true);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Error body shape understood by this client.
#[derive(Debug, Deserialize)]
struct ServerError {
    code: String,
    message: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// Translate a non-success response body into an [`Error`].
fn translate_error_body(
    status: StatusCode,
    body: &str,
    fallback: ErrorCode,
    operation: &str,
) -> Error {
    match serde_json::from_str::<ServerError>(body) {
        Ok(server) => {
            let err = Error::new(ErrorCode::from_wire(&server.code), server.message);
            match server.details {
                Some(details) => err.with_details(details),
                None => err,
            }
        }
        Err(_) => Error::new(fallback, format!("{operation} returned {status}"))
            .with_details(serde_json::json!({ "status": status.as_u16(), "body": body })),
    }
}

fn transport_error(fallback: ErrorCode, operation: &str, e: reqwest::Error) -> Error {
    Error::new(fallback, format!("{operation} request failed: {e}"))
}

async fn check_status(
    response: reqwest::Response,
    fallback: ErrorCode,
    operation: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("<no body>"));
    Err(translate_error_body(status, &body, fallback, operation))
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback: ErrorCode,
    operation: &str,
) -> Result<T> {
    let response = check_status(response, fallback.clone(), operation).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| Error::new(fallback, format!("invalid {operation} response: {e}")))
}

/// Client for one registered OAuth client against one authorization server.
#[derive(Clone)]
pub struct AuthServerClient {
    http: reqwest::Client,
    config: Arc<AuthConfig>,
    store: Arc<dyn CredentialStore>,
}

impl AuthServerClient {
    pub fn new(
        config: Arc<AuthConfig>,
        store: Arc<dyn CredentialStore>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            config,
            store,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    fn endpoint(&self, path: &str, fallback: ErrorCode) -> Result<Url> {
        self.config
            .endpoint(path)
            .map_err(|e| Error::new(fallback, format!("invalid {path} endpoint: {e}")))
    }

    /// Form fields common to every client-authenticated POST.
    fn client_fields(&self) -> Vec<(&str, &str)> {
        let mut fields = vec![("client_id", self.config.client_id.as_str())];
        if let Some(secret) = &self.config.client_secret {
            fields.push(("client_secret", secret.expose_str()));
        }
        fields
    }

    /// Build the authorization redirect for `state`.
    ///
    /// For the code flow a fresh verifier is persisted first (replacing any
    /// outstanding one) and its S256 challenge is appended.
    pub fn authorize_url(&self, state: &str) -> Result<Url> {
        let mut url = self.endpoint(AUTHORIZE_PATH, ErrorCode::AuthorizeFailed)?;
        let response_type = self.config.response_type;

        let challenge = match response_type {
            ResponseType::Code => {
                let verifier = pkce::generate_code_verifier();
                self.store.set(StorageKey::PkceCodeVerifier, &verifier)?;
                Some(pkce::compute_code_challenge(&verifier))
            }
            ResponseType::Token => None,
        };

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", response_type.as_str())
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", self.config.redirect_uri.as_str())
                .append_pair("state", state);
            if let Some(scope) = &self.config.scope {
                query.append_pair("scope", scope);
            }
            if let Some(challenge) = &challenge {
                query
                    .append_pair("code_challenge", challenge)
                    .append_pair("code_challenge_method", CODE_CHALLENGE_METHOD);
            }
        }

        debug!(response_type = response_type.as_str(), "built authorize URL");
        Ok(url)
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Requires the verifier persisted by [`Self::authorize_url`]; without it
    /// no request is sent. The verifier is single-use and removed on success.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenPair> {
        let verifier = self.store.get(StorageKey::PkceCodeVerifier).ok_or_else(|| {
            Error::new(
                ErrorCode::MissingCodeVerifier,
                "no PKCE code verifier stored for this session",
            )
        })?;
        let url = self.endpoint(TOKEN_PATH, ErrorCode::ExchangeFailed)?;

        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", verifier.as_str()),
        ];
        form.extend(self.client_fields());

        let response = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(ErrorCode::ExchangeFailed, "token exchange", e))?;
        let tokens: TokenResponse =
            read_json(response, ErrorCode::ExchangeFailed, "token exchange").await?;

        self.persist_tokens(&tokens)?;
        self.store.remove(StorageKey::PkceCodeVerifier)?;
        info!(client_id = %self.config.client_id, "authorization code exchanged");

        Ok(TokenPair {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    /// Renew the access token with the stored refresh token.
    ///
    /// The refresh token is introspected first so a revoked token fails fast
    /// with `refresh_token_inactive`. The stored refresh token is replaced
    /// only when the server rotates it.
    pub async fn refresh(&self) -> Result<TokenPair> {
        let refresh = self.store.get(StorageKey::RefreshToken).ok_or_else(|| {
            Error::new(ErrorCode::NoRefreshToken, "no refresh token stored")
        })?;

        let introspection = self
            .introspect_or_inactive(&refresh, TokenTypeHint::RefreshToken)
            .await;
        if !introspection.active {
            return Err(Error::new(
                ErrorCode::RefreshTokenInactive,
                "refresh token is inactive or expired",
            ));
        }

        let url = self.endpoint(TOKEN_PATH, ErrorCode::RefreshFailed)?;
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh.as_str()),
        ];
        form.extend(self.client_fields());

        let response = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(ErrorCode::RefreshFailed, "token refresh", e))?;
        let tokens: TokenResponse =
            read_json(response, ErrorCode::RefreshFailed, "token refresh").await?;

        self.persist_tokens(&tokens)?;
        let rotated = tokens.refresh_token.is_some();
        info!(client_id = %self.config.client_id, rotated, "access token refreshed");

        Ok(TokenPair {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token.or_else(|| Some(refresh.into())),
        })
    }

    /// Load the profile for the stored access token.
    ///
    /// The token is introspected first; the server, not local `exp` parsing,
    /// decides whether it is still active.
    pub async fn fetch_user_info(&self) -> Result<User> {
        let token = self
            .store
            .get(StorageKey::AccessToken)
            .ok_or_else(|| Error::new(ErrorCode::NoAccessToken, "no access token stored"))?;

        let introspection = self
            .introspect_or_inactive(&token, TokenTypeHint::AccessToken)
            .await;
        if !introspection.active {
            return Err(Error::new(
                ErrorCode::TokenInactive,
                "access token is inactive or expired",
            ));
        }

        let url = self.endpoint(USERINFO_PATH, ErrorCode::UserinfoFailed)?;
        let response = self
            .http
            .get(url)
            .query(&[("access_token", token.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(ErrorCode::UserinfoFailed, "userinfo", e))?;
        let user: User = read_json(response, ErrorCode::UserinfoFailed, "userinfo").await?;

        debug!(user_id = %user.id, "fetched user info");
        Ok(user)
    }

    /// RFC 7662 introspection of `token`.
    pub async fn introspect_token(&self, token: &str, hint: TokenTypeHint) -> Result<Introspection> {
        let url = self.endpoint(INTROSPECT_PATH, ErrorCode::IntrospectFailed)?;
        let mut form = vec![("token", token), ("token_type_hint", hint.as_str())];
        form.extend(self.client_fields());

        let response = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(ErrorCode::IntrospectFailed, "introspection", e))?;
        read_json(response, ErrorCode::IntrospectFailed, "introspection").await
    }

    /// Introspect, treating any failure as an inactive token.
    async fn introspect_or_inactive(&self, token: &str, hint: TokenTypeHint) -> Introspection {
        match self.introspect_token(token, hint).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    code = %e.code,
                    error = %e.message,
                    token_type = hint.as_str(),
                    "introspection failed, treating token as inactive"
                );
                Introspection::inactive()
            }
        }
    }

    /// End the server-side session. Callers decide whether failure matters.
    pub async fn logout(&self) -> Result<()> {
        let url = self.endpoint(LOGOUT_PATH, ErrorCode::LogoutFailed)?;
        let response = self
            .http
            .post(url)
            .form(&[("client_id", self.config.client_id.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(ErrorCode::LogoutFailed, "logout", e))?;
        check_status(response, ErrorCode::LogoutFailed, "logout").await?;
        info!(client_id = %self.config.client_id, "server session ended");
        Ok(())
    }

    /// RFC 7009 revocation of `token`.
    pub async fn revoke_token(&self, token: &str, hint: TokenTypeHint) -> Result<()> {
        let url = self.endpoint(REVOKE_PATH, ErrorCode::RevokeFailed)?;
        let mut form = vec![("token", token), ("token_type_hint", hint.as_str())];
        form.extend(self.client_fields());

        let response = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(ErrorCode::RevokeFailed, "revocation", e))?;
        check_status(response, ErrorCode::RevokeFailed, "revocation").await?;
        debug!(token_type = hint.as_str(), "token revoked");
        Ok(())
    }

    fn persist_tokens(&self, tokens: &TokenResponse) -> Result<()> {
        self.store
            .set(StorageKey::AccessToken, tokens.access_token.expose_str())?;
        if let Some(refresh) = &tokens.refresh_token {
            self.store.set(StorageKey::RefreshToken, refresh.expose_str())?;
        }
        Ok(())
    }
}
