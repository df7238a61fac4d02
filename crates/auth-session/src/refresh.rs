//! Proactive background token refresh
//!
//! Spawns a periodic task that renews the access token before it expires,
//! so protected routes rarely see an expired session. The task runs
//! independently of navigation and shares the session's flow lock.

use std::sync::Arc;
use std::time::Duration;

use oauth_client::{StorageKey, claims};
use tracing::{debug, info, warn};

use crate::session::AuthSession;

/// What one refresh cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshCycle {
    /// Not authenticated, nothing to refresh with, or the token is not close
    /// to expiry
    Skipped,
    Refreshed,
    /// Refresh failed; the session is now unauthenticated
    Failed,
}

/// Spawn a background task that refreshes the session's access token.
///
/// Runs every `interval` and refreshes when the session is authenticated, a
/// refresh token is stored and the access token expires within `threshold`.
pub fn spawn_refresh_task(
    session: Arc<AuthSession>,
    interval: Duration,
    threshold: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick is immediate; the startup determination covers it
        ticker.tick().await;

        loop {
            ticker.tick().await;
            refresh_cycle(&session, threshold).await;
        }
    })
}

/// Run one refresh cycle.
pub async fn refresh_cycle(session: &AuthSession, threshold: Duration) -> RefreshCycle {
    if session.is_loading() || !session.is_authenticated() {
        return RefreshCycle::Skipped;
    }

    let store = session.client().store();
    if store.get(StorageKey::RefreshToken).is_none() {
        debug!("no refresh token stored, leaving session as is");
        return RefreshCycle::Skipped;
    }

    // Opaque tokens carry no local expiry; the server judges them on the
    // next determination instead.
    let Some(expires_at) = store
        .get(StorageKey::AccessToken)
        .and_then(|token| claims::expires_at_millis(&token))
    else {
        debug!("access token has no readable expiry, not refreshing");
        return RefreshCycle::Skipped;
    };

    let threshold_millis = u64::try_from(threshold.as_millis()).unwrap_or(u64::MAX);
    if expires_at > claims::now_millis().saturating_add(threshold_millis) {
        return RefreshCycle::Skipped;
    }

    debug!(expires_at, "access token expiring within threshold, refreshing");
    if session.refresh().await {
        info!("background token refresh succeeded");
        RefreshCycle::Refreshed
    } else {
        warn!("background token refresh failed, session ended");
        RefreshCycle::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockServer, fresh_jwt, jwt_with_exp, session_at};
    use oauth_client::{CredentialStore, MemoryStore};

    async fn authenticated_with(server: &MockServer, token: &str) -> (Arc<AuthSession>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.set(StorageKey::AccessToken, token).unwrap();
        store.set(StorageKey::RefreshToken, "rt_1").unwrap();
        let (session, _) = session_at(server, "http://app.test/", store.clone());
        session.determine().await;
        assert!(session.is_authenticated());
        (session, store)
    }

    #[tokio::test]
    async fn skips_when_unauthenticated() {
        let server = MockServer::start().await;
        let (session, _) = session_at(&server, "http://app.test/", Arc::new(MemoryStore::new()));
        session.determine().await;

        let cycle = refresh_cycle(&session, Duration::from_secs(60)).await;
        assert_eq!(cycle, RefreshCycle::Skipped);
        assert_eq!(server.token_requests(), 0);
    }

    #[tokio::test]
    async fn skips_token_far_from_expiry() {
        let server = MockServer::start().await;
        let (session, _) = authenticated_with(&server, &fresh_jwt()).await;

        let cycle = refresh_cycle(&session, Duration::from_secs(60)).await;
        assert_eq!(cycle, RefreshCycle::Skipped);
        assert_eq!(server.token_requests(), 0);
    }

    #[tokio::test]
    async fn refreshes_token_inside_threshold() {
        let server = MockServer::start().await;
        let soon = claims::now_millis() / 1000 + 30;
        let (session, store) = authenticated_with(&server, &jwt_with_exp(soon)).await;

        let cycle = refresh_cycle(&session, Duration::from_secs(300)).await;
        assert_eq!(cycle, RefreshCycle::Refreshed);
        assert!(session.is_authenticated());
        assert_eq!(store.get(StorageKey::RefreshToken).as_deref(), Some("rt_new"));
    }

    #[tokio::test]
    async fn implicit_session_without_refresh_token_survives() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        store.set(StorageKey::OauthState, "s1").unwrap();
        let (session, _) = session_at(
            &server,
            "http://app.test/callback?access_token=at_opaque&state=s1",
            store.clone(),
        );
        session.determine().await;
        assert!(session.is_authenticated());

        let cycle = refresh_cycle(&session, Duration::from_secs(60)).await;
        assert_eq!(cycle, RefreshCycle::Skipped);
        assert!(session.is_authenticated());
        assert_eq!(store.get(StorageKey::AccessToken).as_deref(), Some("at_opaque"));
        assert_eq!(server.token_requests(), 0);
    }

    #[tokio::test]
    async fn skips_opaque_token_with_refresh_token() {
        let server = MockServer::start().await;
        let (session, store) = authenticated_with(&server, &fresh_jwt()).await;
        store.set(StorageKey::AccessToken, "at_opaque").unwrap();

        let cycle = refresh_cycle(&session, Duration::from_secs(60)).await;
        assert_eq!(cycle, RefreshCycle::Skipped);
        assert!(session.is_authenticated());
        assert_eq!(store.get(StorageKey::RefreshToken).as_deref(), Some("rt_1"));
        assert_eq!(server.token_requests(), 0);
    }

    #[tokio::test]
    async fn huge_threshold_saturates_instead_of_overflowing() {
        let server = MockServer::start().await;
        let (session, _) = authenticated_with(&server, &fresh_jwt()).await;

        let cycle = refresh_cycle(&session, Duration::MAX).await;
        assert_eq!(cycle, RefreshCycle::Refreshed);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn failed_refresh_ends_session() {
        let server = MockServer::start().await;
        let soon = claims::now_millis() / 1000 + 30;
        let (session, store) = authenticated_with(&server, &jwt_with_exp(soon)).await;
        server.set_token_status(401);

        let cycle = refresh_cycle(&session, Duration::from_secs(300)).await;
        assert_eq!(cycle, RefreshCycle::Failed);
        assert!(!session.is_authenticated());
        assert!(store.is_empty());
    }
}
