//! Service-specific error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Request-level failures that surface as HTTP error responses.
///
/// Determination and logout never fail from the handler's point of view;
/// only starting a login can.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to start login: {0}")]
    Login(#[from] auth_session::Error),
}

impl Error {
    fn code(&self) -> &str {
        match self {
            Error::Login(auth_session::Error::Auth(e)) => e.code.as_str(),
            Error::Login(auth_session::Error::SettleTimeout(_)) => "settle_timeout",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        let body = serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        (
            StatusCode::BAD_GATEWAY,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
