//! Observable authentication state
//!
//! The phase machine is a pure function: it receives an event and returns
//! the next phase. `AuthSession` applies it and publishes the result.
//!
//! Transitions:
//! - any phase → Determining (startup determination, refresh, logout)
//! - Determining → Authenticated | Unauthenticated (settled)
//! - Authenticated → Unauthenticated (failure outside a determination)

use oauth_client::User;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    Uninitialized,
    Determining,
    Authenticated,
    Unauthenticated,
}

impl AuthPhase {
    pub fn label(self) -> &'static str {
        match self {
            AuthPhase::Uninitialized => "uninitialized",
            AuthPhase::Determining => "determining",
            AuthPhase::Authenticated => "authenticated",
            AuthPhase::Unauthenticated => "unauthenticated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// A determination, refresh or logout started
    Begin,
    /// Credentials confirmed and user loaded
    Authenticated,
    /// No usable credentials
    Unauthenticated,
}

/// Next phase for `event`. Pure function: no I/O.
///
/// Events that make no sense in the current phase leave it unchanged.
pub fn next_phase(phase: AuthPhase, event: PhaseEvent) -> AuthPhase {
    match (phase, event) {
        (_, PhaseEvent::Begin) => AuthPhase::Determining,
        (AuthPhase::Determining, PhaseEvent::Authenticated) => AuthPhase::Authenticated,
        (AuthPhase::Determining | AuthPhase::Authenticated, PhaseEvent::Unauthenticated) => {
            AuthPhase::Unauthenticated
        }
        (AuthPhase::Authenticated, PhaseEvent::Authenticated)
        | (AuthPhase::Unauthenticated, PhaseEvent::Unauthenticated) => phase,
        (phase, event) => {
            debug!(phase = phase.label(), ?event, "ignoring phase event");
            phase
        }
    }
}

/// Snapshot published to every subscriber.
///
/// `user.is_some()` implies `is_authenticated`. The reverse does not hold
/// while the profile fetch of an implicit-flow callback is in flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthState {
    pub phase: AuthPhase,
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub user: Option<User>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            phase: AuthPhase::Uninitialized,
            is_loading: true,
            is_authenticated: false,
            user: None,
        }
    }
}

/// Lifecycle notifications, broadcast to every `events()` receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// Loading ended; emitted exactly once per determination, refresh or logout
    Settled { authenticated: bool },
    /// Callback `state` did not match the persisted CSRF state
    CallbackRejected,
    /// Browser was sent to the authorization server
    LoginStarted,
    /// Local session cleared by `logout()`
    LoggedOut,
}
