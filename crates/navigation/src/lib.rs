//! Routing-side contract for authentication guards
//!
//! Defines what a router hands to a guard (`RouteContext` with the target's
//! declared `RouteMeta`) and what it gets back (`Verdict`). The `Guard` trait
//! is the seam between the router and whatever decides access; the session
//! crate provides the two implementations (protected route, login page).
//!
//! `Location` abstracts the address bar: reading the current URL, replacing
//! it without navigation (history replace) and leaving for another URL.

pub mod location;

pub use location::{Location, MemoryLocation};

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use url::Url;

/// Role requirement declared on a route: one role or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleSpec {
    One(String),
    Many(Vec<String>),
}

impl RoleSpec {
    /// Requested roles as a slice view.
    pub fn as_slice(&self) -> &[String] {
        match self {
            RoleSpec::One(role) => std::slice::from_ref(role),
            RoleSpec::Many(roles) => roles,
        }
    }
}

impl From<&str> for RoleSpec {
    fn from(role: &str) -> Self {
        RoleSpec::One(role.to_string())
    }
}

impl From<String> for RoleSpec {
    fn from(role: String) -> Self {
        RoleSpec::One(role)
    }
}

impl From<Vec<String>> for RoleSpec {
    fn from(roles: Vec<String>) -> Self {
        RoleSpec::Many(roles)
    }
}

impl From<Vec<&str>> for RoleSpec {
    fn from(roles: Vec<&str>) -> Self {
        RoleSpec::Many(roles.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for RoleSpec {
    fn from(roles: [&str; N]) -> Self {
        RoleSpec::Many(roles.iter().map(|r| r.to_string()).collect())
    }
}

/// Access metadata declared on a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<RoleSpec>,
    /// AND semantics over `roles` instead of the default OR
    #[serde(default)]
    pub require_all_roles: bool,
}

impl RouteMeta {
    pub fn with_roles(roles: impl Into<RoleSpec>, require_all_roles: bool) -> Self {
        Self {
            roles: Some(roles.into()),
            require_all_roles,
        }
    }
}

/// Navigation target as seen by a guard.
#[derive(Debug, Clone, Default)]
pub struct RouteContext {
    pub name: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub meta: RouteMeta,
}

impl RouteContext {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Context for navigating to `url`; repeated query keys keep the last value.
    pub fn from_url(name: impl Into<String>, url: &Url) -> Self {
        Self {
            name: name.into(),
            path: url.path().to_string(),
            query: url.query_pairs().into_owned().collect(),
            meta: RouteMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    /// Redirect to a named route
    RedirectNamed {
        name: String,
        params: BTreeMap<String, String>,
    },
    /// Redirect to a literal path or URL
    RedirectPath(String),
}

impl Verdict {
    pub fn redirect_to(name: impl Into<String>) -> Self {
        Verdict::RedirectNamed {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}

/// Pre-navigation hook installed in the router.
///
/// Returns a boxed future so guards can be held as `Arc<dyn Guard>`.
pub trait Guard: Send + Sync {
    /// Identifier for logging (e.g. "protected-route", "login-page")
    fn id(&self) -> &str;

    fn check<'a>(
        &'a self,
        route: &'a RouteContext,
    ) -> Pin<Box<dyn Future<Output = Verdict> + Send + 'a>>;
}
