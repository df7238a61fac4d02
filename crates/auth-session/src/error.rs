//! Error types for session operations

use std::time::Duration;

/// Errors surfaced by the session. Determination, refresh and logout never
/// return these; they resolve failures into the unauthenticated state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] oauth_client::Error),

    #[error("auth state did not settle within {0:?}")]
    SettleTimeout(Duration),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
