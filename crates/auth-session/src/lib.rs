//! Authentication session state machine and route guards
//!
//! `AuthSession` owns the observable authentication state and drives the
//! OAuth lifecycle on top of `oauth_client::AuthServerClient`:
//!
//! 1. Construction persists a CSRF state if none exists; state is `Uninitialized`, loading
//! 2. `determine()` inspects the current URL: a callback visit is validated
//!    and exchanged, an ordinary visit restores or silently refreshes the session
//! 3. Loading ends exactly once per determination, with the session either
//!    `Authenticated` (user loaded) or `Unauthenticated` (credentials cleared)
//! 4. `login()` redirects to the authorization server; `logout()` always
//!    clears locally, even when the server is unreachable
//! 5. Guards wait for the state to settle, then allow or redirect
//! 6. The background refresh task renews tokens before they expire

mod callback;
pub mod error;
pub mod guard;
pub mod metrics;
pub mod refresh;
pub mod roles;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use guard::{
    ACCESS_DENIED_ROUTE, DEFAULT_RETURN_URL, LOGIN_ROUTE, LoginPageGuard, ProtectedRouteGuard,
    RETURN_URL_PARAM, login_page_guard, protected_route_guard,
};
pub use refresh::{RefreshCycle, spawn_refresh_task};
pub use roles::has_role;
pub use session::AuthSession;
pub use state::{AuthEvent, AuthPhase, AuthState, PhaseEvent, next_phase};
