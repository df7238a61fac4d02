//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The OAuth client secret is loaded from the OAUTH_CLIENT_SECRET env var or
//! client_secret_file, never stored in the TOML directly to avoid leaking it.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use common::Secret;
use navigation::RouteMeta;
use oauth_client::{AuthConfig, ResponseType};
use serde::Deserialize;
use url::Url;

pub const CLIENT_SECRET_ENV: &str = "OAUTH_CLIENT_SECRET";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub oauth: OAuthConfig,
    pub agent: AgentConfig,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Registered client and authorization server
#[derive(Debug, Deserialize)]
pub struct OAuthConfig {
    #[serde(flatten)]
    pub client: AuthConfig,
    /// Path to a file containing the client secret (alternative to OAUTH_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
}

/// HTTP listener and session settings
#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    pub listen_addr: SocketAddr,
    /// Where tokens and flow state persist; in memory when unset
    #[serde(default)]
    pub credential_file: Option<PathBuf>,
    /// Landing path after login when no returnUrl was requested
    #[serde(default)]
    pub return_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Background refresh period; 0 disables the task
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Refresh tokens expiring within this window; at least one interval
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold_secs: u64,
    /// Upper bound on how long a guard waits for the session to settle
    #[serde(default)]
    pub settle_timeout_secs: Option<u64>,
}

/// Protected route served by the agent
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub meta: RouteMeta,
}

fn default_timeout() -> u64 {
    30
}

fn default_max_connections() -> usize {
    256
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_refresh_threshold() -> u64 {
    300
}

/// One day; longer windows refresh every token on every tick.
const MAX_REFRESH_THRESHOLD_SECS: u64 = 86_400;

fn require_http(field: &str, url: &Url) -> common::Result<()> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(common::Error::Config(format!(
            "{field} must start with http:// or https://, got: {url}"
        ))),
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order:
    /// 1. OAUTH_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.validate()?;

        if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV) {
            config.oauth.client.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.oauth.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.oauth.client.client_secret = Some(Secret::new(secret));
            }
        }

        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        let client = &self.oauth.client;
        if client.client_id.trim().is_empty() {
            return Err(common::Error::Config("client_id must not be empty".into()));
        }
        require_http("server_url", &client.server_url)?;
        require_http("redirect_uri", &client.redirect_uri)?;
        // The implicit flow returns its token in the URL fragment, which a
        // browser never sends to the server behind `/callback`.
        if client.response_type == ResponseType::Token {
            return Err(common::Error::Config(
                "response_type \"token\" is not supported by the agent, use \"code\"".into(),
            ));
        }

        if self.agent.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if self.agent.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }
        let agent = &self.agent;
        if agent.refresh_interval_secs > 0
            && !(agent.refresh_interval_secs..=MAX_REFRESH_THRESHOLD_SECS)
                .contains(&agent.refresh_threshold_secs)
        {
            return Err(common::Error::Config(format!(
                "refresh_threshold_secs must be between refresh_interval_secs ({}) and {MAX_REFRESH_THRESHOLD_SECS}, got: {}",
                agent.refresh_interval_secs, agent.refresh_threshold_secs
            )));
        }
        if let Some(return_url) = &self.agent.return_url
            && !auth_session::guard::is_local_path(return_url)
        {
            return Err(common::Error::Config(format!(
                "return_url must be a local path starting with '/', got: {return_url}"
            )));
        }

        let mut seen = HashSet::new();
        for route in &self.routes {
            if !seen.insert(route.path.as_str()) {
                return Err(common::Error::Config(format!(
                    "route path {} is declared more than once",
                    route.path
                )));
            }
            if !route.path.starts_with('/') {
                return Err(common::Error::Config(format!(
                    "route {} path must start with '/', got: {}",
                    route.name, route.path
                )));
            }
            if crate::RESERVED_PATHS.contains(&route.path.as_str()) {
                return Err(common::Error::Config(format!(
                    "route {} uses reserved path {}",
                    route.name, route.path
                )));
            }
        }
        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("auth-agent.toml")
    }
}
