//! Authentication session: lifecycle driver and state owner
//!
//! One `AuthSession` per application, constructed explicitly and shared as
//! `Arc<AuthSession>`. State is published on a watch channel, lifecycle
//! events on a broadcast channel.
//!
//! Determination, login, logout and refresh are serialized through one
//! async flow lock. The runtime is multi-threaded, so two flows could
//! otherwise interleave their writes to the CSRF state and PKCE verifier.

use std::sync::Arc;

use navigation::{Location, RoleSpec};
use oauth_client::{
    AuthConfig, AuthServerClient, CredentialStore, ErrorCode, StorageKey, TokenTypeHint, User,
    claims, pkce,
};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::callback::{CallbackParams, strip_callback_params};
use crate::error::Result;
use crate::metrics;
use crate::roles;
use crate::state::{AuthEvent, AuthState, PhaseEvent, next_phase};

/// Buffered lifecycle events per receiver before lagging.
const EVENT_CAPACITY: usize = 32;

/// Terminal result of one flow.
#[derive(Debug)]
enum Outcome {
    Authenticated(User),
    Unauthenticated,
    /// Callback state mismatch; nothing was processed or cleared
    Rejected,
}

impl Outcome {
    fn label(&self) -> &'static str {
        match self {
            Outcome::Authenticated(_) => "authenticated",
            Outcome::Unauthenticated => "unauthenticated",
            Outcome::Rejected => "rejected",
        }
    }
}

pub struct AuthSession {
    client: AuthServerClient,
    location: Arc<dyn Location>,
    state: watch::Sender<AuthState>,
    events: broadcast::Sender<AuthEvent>,
    flow: Mutex<()>,
}

impl AuthSession {
    /// Create a session in the `Uninitialized`, loading state.
    ///
    /// A CSRF state is generated and persisted unless one already exists;
    /// an existing one belongs to a redirect that may be returning now.
    pub fn new(client: AuthServerClient, location: Arc<dyn Location>) -> Result<Self> {
        let store = client.store();
        if store.get(StorageKey::OauthState).is_none() {
            store.set(StorageKey::OauthState, &pkce::generate_state())?;
        }

        let (state, _) = watch::channel(AuthState::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(
            client_id = %client.config().client_id,
            response_type = client.config().response_type.as_str(),
            "auth session created"
        );

        Ok(Self {
            client,
            location,
            state,
            events,
            flow: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &AuthConfig {
        self.client.config()
    }

    pub fn client(&self) -> &AuthServerClient {
        &self.client
    }

    fn store(&self) -> &Arc<dyn CredentialStore> {
        self.client.store()
    }

    /// Current state snapshot.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Receiver for lifecycle events emitted from now on.
    pub fn events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Resolve once loading is false, returning the settled state.
    pub async fn wait_settled(&self) -> AuthState {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let settled = match rx.wait_for(|s| !s.is_loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Role query over the current in-memory state. Never revalidates.
    pub fn has_role(&self, role: Option<&RoleSpec>, require_all: bool) -> bool {
        roles::has_role(&self.state.borrow(), role, require_all)
    }

    /// Run the determination on a background task.
    pub fn spawn_determination(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.determine().await })
    }

    /// Decide the authentication state from the current URL and the store.
    ///
    /// Never fails: every error path ends unauthenticated. Loading ends
    /// exactly once, after the terminal outcome.
    pub async fn determine(&self) {
        let _flow = self.flow.lock().await;
        let url = self.location.current();
        self.determine_locked(url).await;
    }

    /// Determine as a page load of `url`.
    ///
    /// The location is set only once the flow lock is held, so a concurrent
    /// visit cannot swap the page out from under a pending callback.
    pub async fn determine_at(&self, url: Url) {
        let _flow = self.flow.lock().await;
        self.location.replace(url.clone());
        self.determine_locked(url).await;
    }

    async fn determine_locked(&self, url: Url) {
        self.begin();

        let outcome = match CallbackParams::parse(&url) {
            Some(params) => self.complete_callback(&url, params).await,
            None => self.restore().await,
        };

        metrics::record_determination(outcome.label());
        self.settle(outcome);
    }

    /// Send the browser to the authorization server.
    ///
    /// A fresh CSRF state replaces the persisted one. Errors building the
    /// URL propagate; there is no local fallback for them.
    pub async fn login(&self) -> Result<Url> {
        let _flow = self.flow.lock().await;

        let state = pkce::generate_state();
        self.store().set(StorageKey::OauthState, &state)?;
        let url = self.client.authorize_url(&state)?;

        info!(
            response_type = self.config().response_type.as_str(),
            "redirecting to authorization server"
        );
        self.location.navigate(url.clone());
        let _ = self.events.send(AuthEvent::LoginStarted);
        Ok(url)
    }

    /// End the session. Server-side failures are logged and ignored; the
    /// local session is always cleared.
    pub async fn logout(&self) {
        let _flow = self.flow.lock().await;
        self.begin();

        if self.config().revoke_on_logout
            && let Some(refresh) = self.store().get(StorageKey::RefreshToken)
            && let Err(e) = self
                .client
                .revoke_token(&refresh, TokenTypeHint::RefreshToken)
                .await
        {
            warn!(code = %e.code, error = %e.message, "refresh token revocation failed");
        }

        let remote_ok = match self.client.logout().await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    code = %e.code,
                    error = %e.message,
                    "server logout failed, clearing local session anyway"
                );
                false
            }
        };
        metrics::record_logout(remote_ok);

        self.clear_local_session();
        self.settle(Outcome::Unauthenticated);
        let _ = self.events.send(AuthEvent::LoggedOut);
        info!(remote_ok, "logged out");
    }

    /// Silent re-authentication with the stored refresh token.
    ///
    /// Re-enters `Determining` for its duration. Returns whether the
    /// session is authenticated afterwards.
    pub async fn refresh(&self) -> bool {
        let _flow = self.flow.lock().await;
        self.begin();

        let outcome = match self.refresh_and_load().await {
            Ok(user) => Outcome::Authenticated(user),
            Err(e) => self.fail("refresh", e),
        };
        let authenticated = matches!(outcome, Outcome::Authenticated(_));

        metrics::record_refresh(if authenticated { "refreshed" } else { "failed" });
        self.settle(outcome);
        authenticated
    }

    async fn complete_callback(&self, url: &Url, params: CallbackParams) -> Outcome {
        let expected = self.store().get(StorageKey::OauthState);
        if expected.as_deref() != Some(params.state.as_str()) {
            warn!(
                has_persisted_state = expected.is_some(),
                "callback state mismatch, rejecting"
            );
            let _ = self.events.send(AuthEvent::CallbackRejected);
            return Outcome::Rejected;
        }

        match (params.code, params.access_token) {
            (Some(code), _) => match self.exchange_and_load(&code).await {
                Ok(user) => {
                    self.location.replace(strip_callback_params(url));
                    Outcome::Authenticated(user)
                }
                Err(e) => self.fail("code exchange", e),
            },
            (None, Some(token)) => {
                self.accept_implicit(url, &token, params.refresh_token.as_deref())
                    .await
            }
            (None, None) => Outcome::Unauthenticated,
        }
    }

    async fn exchange_and_load(&self, code: &str) -> oauth_client::Result<User> {
        self.client.exchange_code(code).await?;
        self.client.fetch_user_info().await
    }

    /// Implicit flow: the token arrived in the redirect itself.
    async fn accept_implicit(&self, url: &Url, token: &str, refresh: Option<&str>) -> Outcome {
        let stored = self.store().set(StorageKey::AccessToken, token).and_then(|()| {
            match refresh {
                Some(refresh) => self.store().set(StorageKey::RefreshToken, refresh),
                None => Ok(()),
            }
        });
        if let Err(e) = stored {
            return self.fail("implicit token storage", e);
        }

        // Authenticated before the profile arrives; loading stays true.
        self.state.send_modify(|s| s.is_authenticated = true);
        self.location.replace(strip_callback_params(url));

        match self.client.fetch_user_info().await {
            Ok(user) => Outcome::Authenticated(user),
            Err(e) => self.fail("user info", e),
        }
    }

    /// Ordinary visit: use the stored token if it is unexpired, otherwise
    /// try a silent refresh.
    async fn restore(&self) -> Outcome {
        let token_valid = self
            .store()
            .get(StorageKey::AccessToken)
            .is_some_and(|token| claims::is_unexpired(&token, claims::now_millis()));

        if token_valid {
            debug!("stored access token unexpired, loading user");
            // Same optimistic flag as the implicit callback; loading stays true.
            self.state.send_modify(|s| s.is_authenticated = true);
            return match self.client.fetch_user_info().await {
                Ok(user) => Outcome::Authenticated(user),
                Err(e) => self.fail("user info", e),
            };
        }

        match self.refresh_and_load().await {
            Ok(user) => Outcome::Authenticated(user),
            Err(e) if e.code == ErrorCode::NoRefreshToken => {
                debug!("no stored credentials, starting unauthenticated");
                self.clear_local_session();
                Outcome::Unauthenticated
            }
            Err(e) => self.fail("silent refresh", e),
        }
    }

    async fn refresh_and_load(&self) -> oauth_client::Result<User> {
        self.client.refresh().await?;
        self.client.fetch_user_info().await
    }

    /// Log `e`, clear credentials and resolve unauthenticated.
    fn fail(&self, stage: &'static str, e: oauth_client::Error) -> Outcome {
        warn!(stage, code = %e.code, error = %e.message, "authentication failed, clearing session");
        self.clear_local_session();
        Outcome::Unauthenticated
    }

    fn clear_local_session(&self) {
        if let Err(e) = self.store().clear_session() {
            error!(code = %e.code, error = %e.message, "failed to clear stored session");
        }
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.phase = next_phase(s.phase, PhaseEvent::Begin);
            s.is_loading = true;
        });
    }

    fn settle(&self, outcome: Outcome) {
        let authenticated = matches!(outcome, Outcome::Authenticated(_));
        self.state.send_modify(|s| {
            match outcome {
                Outcome::Authenticated(user) => {
                    s.phase = next_phase(s.phase, PhaseEvent::Authenticated);
                    s.is_authenticated = true;
                    s.user = Some(user);
                }
                Outcome::Unauthenticated | Outcome::Rejected => {
                    s.phase = next_phase(s.phase, PhaseEvent::Unauthenticated);
                    s.is_authenticated = false;
                    s.user = None;
                }
            }
            s.is_loading = false;
        });
        info!(authenticated, "auth state settled");
        let _ = self.events.send(AuthEvent::Settled { authenticated });
    }
}
