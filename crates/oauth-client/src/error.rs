//! Error types for authorization server operations
//!
//! Every failure carries a symbolic code, a human message and optional
//! structured details. Codes sent by the server in a `{code, message}` body
//! pass through verbatim; everything else maps to the operation's fallback.

use std::fmt;

/// Symbolic error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    MissingCodeVerifier,
    ExchangeFailed,
    UserinfoFailed,
    RefreshFailed,
    RefreshTokenInactive,
    NoRefreshToken,
    TokenInactive,
    NoAccessToken,
    LogoutFailed,
    IntrospectFailed,
    RevokeFailed,
    AuthorizeFailed,
    StorageFailed,
    /// Code reported by the server that this client does not model
    Server(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::MissingCodeVerifier => "missing_code_verifier",
            ErrorCode::ExchangeFailed => "exchange_failed",
            ErrorCode::UserinfoFailed => "userinfo_failed",
            ErrorCode::RefreshFailed => "refresh_failed",
            ErrorCode::RefreshTokenInactive => "refresh_token_inactive",
            ErrorCode::NoRefreshToken => "no_refresh_token",
            ErrorCode::TokenInactive => "token_inactive",
            ErrorCode::NoAccessToken => "no_access_token",
            ErrorCode::LogoutFailed => "logout_failed",
            ErrorCode::IntrospectFailed => "introspect_failed",
            ErrorCode::RevokeFailed => "revoke_failed",
            ErrorCode::AuthorizeFailed => "authorize_failed",
            ErrorCode::StorageFailed => "storage_failed",
            ErrorCode::Server(code) => code,
        }
    }

    /// Map a wire code onto a known variant, keeping unknown codes as `Server`.
    pub fn from_wire(code: &str) -> Self {
        match code {
            "missing_code_verifier" => ErrorCode::MissingCodeVerifier,
            "exchange_failed" => ErrorCode::ExchangeFailed,
            "userinfo_failed" => ErrorCode::UserinfoFailed,
            "refresh_failed" => ErrorCode::RefreshFailed,
            "refresh_token_inactive" => ErrorCode::RefreshTokenInactive,
            "no_refresh_token" => ErrorCode::NoRefreshToken,
            "token_inactive" => ErrorCode::TokenInactive,
            "no_access_token" => ErrorCode::NoAccessToken,
            "logout_failed" => ErrorCode::LogoutFailed,
            "introspect_failed" => ErrorCode::IntrospectFailed,
            "revoke_failed" => ErrorCode::RevokeFailed,
            "authorize_failed" => ErrorCode::AuthorizeFailed,
            "storage_failed" => ErrorCode::StorageFailed,
            other => ErrorCode::Server(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error from an authorization server or credential store operation.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub(crate) fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageFailed, message)
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
