//! Route guards backed by an `AuthSession`
//!
//! Both guards wait for the session to settle before deciding. When the wait
//! fails (only possible with a settle timeout), each falls back to its safe
//! verdict: the protected guard sends the visitor to login, the login-page
//! guard lets the visitor see the login page.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use navigation::{Guard, RouteContext, Verdict};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::session::AuthSession;
use crate::state::AuthState;

pub const LOGIN_ROUTE: &str = "login";
pub const ACCESS_DENIED_ROUTE: &str = "access-denied";
pub const DEFAULT_RETURN_URL: &str = "/dashboard";
/// Query parameter the login page reads its return target from
pub const RETURN_URL_PARAM: &str = "returnUrl";

async fn settled(session: &AuthSession, timeout: Option<Duration>) -> Result<AuthState> {
    match timeout {
        None => Ok(session.wait_settled().await),
        Some(limit) => tokio::time::timeout(limit, session.wait_settled())
            .await
            .map_err(|_| Error::SettleTimeout(limit)),
    }
}

/// Only same-origin absolute paths are accepted as return targets.
pub fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//")
}

/// Guard for routes that require an authenticated session and, optionally,
/// roles declared in the route's meta.
pub struct ProtectedRouteGuard {
    session: Arc<AuthSession>,
    settle_timeout: Option<Duration>,
}

impl ProtectedRouteGuard {
    pub fn new(session: Arc<AuthSession>) -> Self {
        Self {
            session,
            settle_timeout: None,
        }
    }

    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = Some(timeout);
        self
    }

    async fn decide(&self, route: &RouteContext) -> Verdict {
        let state = match settled(&self.session, self.settle_timeout).await {
            Ok(state) => state,
            Err(e) => {
                warn!(route = %route.name, error = %e, "protected route guard failed, sending to login");
                return Verdict::redirect_to(LOGIN_ROUTE);
            }
        };

        if !state.is_authenticated {
            debug!(route = %route.name, "not authenticated, redirecting to login");
            return Verdict::redirect_to(LOGIN_ROUTE);
        }

        if let Some(roles) = &route.meta.roles
            && !crate::roles::has_role(&state, Some(roles), route.meta.require_all_roles)
        {
            debug!(route = %route.name, ?roles, "missing required roles");
            return Verdict::redirect_to(ACCESS_DENIED_ROUTE);
        }

        Verdict::Allow
    }
}

impl Guard for ProtectedRouteGuard {
    fn id(&self) -> &str {
        "protected-route"
    }

    fn check<'a>(
        &'a self,
        route: &'a RouteContext,
    ) -> Pin<Box<dyn Future<Output = Verdict> + Send + 'a>> {
        Box::pin(self.decide(route))
    }
}

/// Guard for the login page: authenticated visitors are sent on to their
/// return target instead.
pub struct LoginPageGuard {
    session: Arc<AuthSession>,
    return_url: String,
    settle_timeout: Option<Duration>,
}

impl LoginPageGuard {
    pub fn new(session: Arc<AuthSession>, return_url: impl Into<String>) -> Self {
        Self {
            session,
            return_url: return_url.into(),
            settle_timeout: None,
        }
    }

    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = Some(timeout);
        self
    }

    pub fn return_url(&self) -> &str {
        &self.return_url
    }

    async fn decide(&self, route: &RouteContext) -> Verdict {
        let state = match settled(&self.session, self.settle_timeout).await {
            Ok(state) => state,
            Err(e) => {
                warn!(route = %route.name, error = %e, "login page guard failed, allowing");
                return Verdict::Allow;
            }
        };

        if !state.is_authenticated {
            return Verdict::Allow;
        }

        let target = match route.query.get(RETURN_URL_PARAM) {
            Some(requested) if is_local_path(requested) => requested.clone(),
            Some(requested) => {
                warn!(requested = %requested, "ignoring non-local return URL");
                self.return_url.clone()
            }
            None => self.return_url.clone(),
        };
        debug!(target = %target, "already authenticated, leaving login page");
        Verdict::RedirectPath(target)
    }
}

impl Guard for LoginPageGuard {
    fn id(&self) -> &str {
        "login-page"
    }

    fn check<'a>(
        &'a self,
        route: &'a RouteContext,
    ) -> Pin<Box<dyn Future<Output = Verdict> + Send + 'a>> {
        Box::pin(self.decide(route))
    }
}

pub fn protected_route_guard(session: Arc<AuthSession>) -> ProtectedRouteGuard {
    ProtectedRouteGuard::new(session)
}

/// Login-page guard returning to `return_url`, or `/dashboard` when `None`.
pub fn login_page_guard(session: Arc<AuthSession>, return_url: Option<&str>) -> LoginPageGuard {
    LoginPageGuard::new(session, return_url.unwrap_or(DEFAULT_RETURN_URL))
}
