//! OAuth2 authorization-server client for browser-style sessions
//!
//! Provides the pieces the session state machine is built from: the
//! credential store contract, PKCE/state generation, JWT expiry parsing and
//! the HTTP façade over the authorization server. Standalone, with no
//! dependency on the session or routing crates.
//!
//! Code flow, end to end:
//! 1. `pkce::generate_state()` is persisted as the CSRF state
//! 2. `AuthServerClient::authorize_url()` persists a verifier and returns the redirect
//! 3. The server redirects back with `code` + `state`
//! 4. `AuthServerClient::exchange_code()` consumes the verifier and stores tokens
//! 5. `AuthServerClient::fetch_user_info()` introspects, then loads the profile
//! 6. `AuthServerClient::refresh()` renews the pair when the access token expires

pub mod claims;
pub mod client;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod pkce;
pub mod types;

pub use claims::{expires_at_millis, is_unexpired, now_millis};
pub use client::{AuthServerClient, default_http_client};
pub use config::{AuthConfig, ResponseType};
pub use credentials::{CredentialStore, FileStore, MemoryStore, StorageKey};
pub use error::{Error, ErrorCode, Result};
pub use pkce::{compute_code_challenge, generate_code_verifier, generate_state};
pub use types::{Introspection, TokenPair, TokenTypeHint, User};
