//! Authorization server endpoint paths and protocol constants
//!
//! Endpoints live at fixed paths below the configured `server_url`.

/// Browser redirect that starts the flow
pub const AUTHORIZE_PATH: &str = "authorize";

/// Code exchange and refresh
pub const TOKEN_PATH: &str = "token";

/// Profile of the token's subject
pub const USERINFO_PATH: &str = "userinfo";

/// RFC 7662 token introspection
pub const INTROSPECT_PATH: &str = "introspect";

/// Server-side session termination
pub const LOGOUT_PATH: &str = "logout";

/// RFC 7009 token revocation
pub const REVOKE_PATH: &str = "revoke";

/// The only PKCE challenge method this client sends
pub const CODE_CHALLENGE_METHOD: &str = "S256";
