//! Auth Agent
//!
//! Single-binary host for one OAuth session:
//! 1. Determines the session at startup from the persisted credential store
//! 2. Serves `/login`, `/callback` and `/logout` to drive the browser through
//!    the authorization server
//! 3. Guards every configured route with the protected-route guard and its
//!    role metadata
//! 4. Refreshes tokens in the background before they expire

mod config;
mod error;
mod metrics;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use auth_session::{
    ACCESS_DENIED_ROUTE, AuthSession, LOGIN_ROUTE, LoginPageGuard, ProtectedRouteGuard,
    RETURN_URL_PARAM, guard::is_local_path, login_page_guard, protected_route_guard,
    spawn_refresh_task,
};
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use navigation::{Guard, MemoryLocation, RouteContext, Verdict};
use oauth_client::{AuthServerClient, CredentialStore, FileStore, MemoryStore, default_http_client};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::{Position, Url};

use crate::config::{Config, RouteConfig};

/// Paths served by the agent itself; configured routes may not use them
pub(crate) const RESERVED_PATHS: &[&str] = &[
    "/login",
    "/callback",
    "/logout",
    "/access-denied",
    "/health",
    "/metrics",
];

/// How long in-flight requests may drain after a shutdown signal
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    session: Arc<AuthSession>,
    location: Arc<MemoryLocation>,
    /// Scheme, host and port the browser sees, taken from `redirect_uri`
    origin: Url,
    protected: Arc<ProtectedRouteGuard>,
    login_guard: Arc<LoginPageGuard>,
    /// Configured route name to path, for named redirects
    route_paths: Arc<HashMap<String, String>>,
    /// returnUrl captured at `/login`, consumed by `/callback`
    pending_return: Arc<Mutex<Option<String>>>,
    prometheus: PrometheusHandle,
    started_at: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AppState {
    fn new(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        http: reqwest::Client,
        prometheus: PrometheusHandle,
    ) -> Result<Self> {
        let client_config = config.oauth.client.clone();
        let mut origin = client_config.redirect_uri.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);

        let location = Arc::new(MemoryLocation::new(origin.clone()));
        let client = AuthServerClient::new(Arc::new(client_config), store, http);
        let session = Arc::new(
            AuthSession::new(client, location.clone()).context("failed to create auth session")?,
        );

        let mut protected = protected_route_guard(session.clone());
        let mut login_guard = login_page_guard(session.clone(), config.agent.return_url.as_deref());
        if let Some(secs) = config.agent.settle_timeout_secs {
            protected = protected.with_settle_timeout(Duration::from_secs(secs));
            login_guard = login_guard.with_settle_timeout(Duration::from_secs(secs));
        }

        let route_paths = config
            .routes
            .iter()
            .map(|r| (r.name.clone(), r.path.clone()))
            .collect();

        Ok(Self {
            session,
            location,
            origin,
            protected: Arc::new(protected),
            login_guard: Arc::new(login_guard),
            route_paths: Arc::new(route_paths),
            pending_return: Arc::new(Mutex::new(None)),
            prometheus,
            started_at: Instant::now(),
        })
    }

    /// Absolute page URL the browser requested.
    ///
    /// Handlers never write it into the shared location; only the callback
    /// hands it to the session, under the session's flow lock.
    fn page_url(&self, uri: &Uri) -> Url {
        let target = uri.path_and_query().map_or("/", |pq| pq.as_str());
        self.origin
            .join(target)
            .unwrap_or_else(|_| self.origin.clone())
    }

    /// Where a guard verdict sends the browser; `None` for `Allow`.
    fn redirect_target(&self, verdict: &Verdict, requested: &Url) -> Option<String> {
        match verdict {
            Verdict::Allow => None,
            Verdict::RedirectPath(path) => Some(path.clone()),
            Verdict::RedirectNamed { name, params } => {
                let path = match name.as_str() {
                    LOGIN_ROUTE => "/login",
                    ACCESS_DENIED_ROUTE => "/access-denied",
                    other => self.route_paths.get(other).map_or("/", String::as_str),
                };
                let mut target = self.origin.join(path).unwrap_or_else(|_| self.origin.clone());
                {
                    let mut query = target.query_pairs_mut();
                    for (key, value) in params {
                        query.append_pair(key, value);
                    }
                    if name == LOGIN_ROUTE && !params.contains_key(RETURN_URL_PARAM) {
                        query.append_pair(
                            RETURN_URL_PARAM,
                            &requested[Position::BeforePath..Position::AfterQuery],
                        );
                    }
                }
                if target.query() == Some("") {
                    target.set_query(None);
                }
                Some(target[Position::BeforePath..].to_string())
            }
        }
    }
}

/// 302 to `target`.
fn found(target: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, target.to_string())]).into_response()
}

fn observed(route: &str, started: Instant, response: Response) -> Response {
    metrics::record_request(
        route,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Build the axum router with all routes and shared state.
///
/// Applies a concurrency limit layer based on `max_connections`.
fn build_router(state: AppState, routes: &[RouteConfig], max_connections: usize) -> Router {
    let mut router = Router::new()
        .route("/login", get(login_handler))
        .route("/callback", get(callback_handler))
        .route("/logout", get(logout_handler).post(logout_handler))
        .route("/access-denied", get(access_denied_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    for route in routes {
        let route = Arc::new(route.clone());
        let path = route.path.clone();
        router = router.route(
            &path,
            get(move |State(state): State<AppState>, uri: Uri| {
                let route = Arc::clone(&route);
                async move { protected_handler(state, route, uri).await }
            }),
        );
    }

    router
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting auth-agent");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle =
        metrics::install_recorder().context("failed to install Prometheus recorder")?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.agent.listen_addr,
        server_url = %config.oauth.client.server_url,
        client_id = %config.oauth.client.client_id,
        response_type = config.oauth.client.response_type.as_str(),
        confidential = config.oauth.client.client_secret.is_some(),
        routes = config.routes.len(),
        "configuration loaded"
    );

    let http = default_http_client(Some(Duration::from_secs(config.agent.timeout_secs)))
        .context("failed to build HTTP client")?;

    let store: Arc<dyn CredentialStore> = match &config.agent.credential_file {
        Some(path) => Arc::new(FileStore::load(path.clone()).with_context(|| {
            format!("failed to open credential file {}", path.display())
        })?),
        None => {
            warn!("no credential_file configured, session will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let app_state = AppState::new(&config, store, http, prometheus_handle)?;
    let session = app_state.session.clone();

    // Startup determination runs in the background; guards wait for it
    session.spawn_determination();

    let refresh_handle = (config.agent.refresh_interval_secs > 0).then(|| {
        info!(
            interval_secs = config.agent.refresh_interval_secs,
            threshold_secs = config.agent.refresh_threshold_secs,
            "background token refresh enabled"
        );
        spawn_refresh_task(
            session.clone(),
            Duration::from_secs(config.agent.refresh_interval_secs),
            Duration::from_secs(config.agent.refresh_threshold_secs),
        )
    });

    let app = build_router(app_state, &config.routes, config.agent.max_connections);

    let listen_addr = config.agent.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timeout starts when the shutdown signal fires, not when the
    // server starts.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;

    if let Some(handle) = refresh_handle {
        handle.abort();
    }
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    info!("shutdown complete");
    Ok(())
}

/// Login page: authenticated visitors go to their return target, everyone
/// else is sent to the authorization server.
async fn login_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let started = Instant::now();
    let response = match start_login(&state, &uri).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };
    observed("login", started, response)
}

async fn start_login(state: &AppState, uri: &Uri) -> Result<Response, error::Error> {
    let url = state.page_url(uri);
    let route = RouteContext::from_url(LOGIN_ROUTE, &url);

    let verdict = state.login_guard.check(&route).await;
    if let Some(target) = state.redirect_target(&verdict, &url) {
        return Ok(found(&target));
    }

    let requested = route
        .query
        .get(RETURN_URL_PARAM)
        .filter(|target| is_local_path(target))
        .cloned();
    *lock(&state.pending_return) = requested;

    let authorize = state.session.login().await?;
    // The redirect below is the navigation; drop the recorded copy
    state.location.take_navigation();
    Ok(found(authorize.as_str()))
}

/// Redirect target of the authorization server.
async fn callback_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let started = Instant::now();
    state.session.determine_at(state.page_url(&uri)).await;

    let target = if state.session.is_authenticated() {
        lock(&state.pending_return)
            .take()
            .unwrap_or_else(|| state.login_guard.return_url().to_string())
    } else {
        "/login".to_string()
    };
    observed("callback", started, found(&target))
}

async fn logout_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    state.session.logout().await;
    lock(&state.pending_return).take();
    observed("logout", started, found("/login"))
}

async fn access_denied_handler() -> Response {
    let body = serde_json::json!({
        "code": "access_denied",
        "message": "the signed-in user lacks the roles this route requires",
    });
    (
        StatusCode::FORBIDDEN,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

async fn protected_handler(state: AppState, route: Arc<RouteConfig>, uri: Uri) -> Response {
    let started = Instant::now();
    let url = state.page_url(&uri);
    let context = RouteContext::from_url(route.name.clone(), &url).with_meta(route.meta.clone());

    let verdict = state.protected.check(&context).await;
    let response = match state.redirect_target(&verdict, &url) {
        Some(target) => found(&target),
        None => {
            let body = serde_json::json!({
                "route": route.name,
                "user": state.session.user(),
            });
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                body.to_string(),
            )
                .into_response()
        }
    };
    observed(&route.name, started, response)
}

/// Health endpoint: JSON with uptime and the current auth state snapshot.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "auth": state.session.state(),
    });
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navigation::Location;
    use axum::body::Body;
    use axum::extract::Form;
    use axum::http::Request;
    use axum::routing::post;
    use oauth_client::StorageKey;
    use tower::ServiceExt;

    fn test_prometheus_handle() -> PrometheusHandle {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        recorder.handle()
    }

    /// Authorization server that accepts any code and knows one user with
    /// the `user` role.
    async fn start_auth_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new()
            .route(
                "/oauth/token",
                post(|Form(form): Form<HashMap<String, String>>| async move {
                    assert_eq!(form["client_id"], "agent-client");
                    axum::Json(serde_json::json!({
                        "access_token": "at_agent",
                        "refresh_token": "rt_agent",
                        "expires_in": 3600
                    }))
                }),
            )
            .route(
                "/oauth/introspect",
                post(|| async { axum::Json(serde_json::json!({ "active": true })) }),
            )
            .route(
                "/oauth/userinfo",
                get(|| async {
                    axum::Json(serde_json::json!({
                        "sub": "u7",
                        "preferred_username": "grace",
                        "roles": ["user"]
                    }))
                }),
            )
            .route("/oauth/logout", post(|| async { StatusCode::NO_CONTENT }));

        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/oauth")
    }

    fn test_config(server_url: &str) -> Config {
        let toml = format!(
            r#"
[oauth]
client_id = "agent-client"
redirect_uri = "http://agent.test/callback"
server_url = "{server_url}"

[agent]
listen_addr = "127.0.0.1:0"

[[routes]]
name = "dashboard"
path = "/dashboard"

[[routes]]
name = "admin"
path = "/admin"
roles = "admin"
"#
        );
        toml::from_str(&toml).unwrap()
    }

    async fn test_app() -> (Router, AppState, Arc<MemoryStore>) {
        let server_url = start_auth_server().await;
        let config = test_config(&server_url);
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            &config,
            store.clone(),
            reqwest::Client::new(),
            test_prometheus_handle(),
        )
        .unwrap();
        state.session.determine().await;
        let router = build_router(state.clone(), &config.routes, 64);
        (router, state, store)
    }

    async fn get_request(router: &Router, uri: &str) -> Response {
        router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn location_of(response: &Response) -> String {
        response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// Walk `/login` then `/callback`, returning the callback response.
    async fn sign_in(router: &Router, login_uri: &str) -> Response {
        let login = get_request(router, login_uri).await;
        assert_eq!(login.status(), StatusCode::FOUND);
        let authorize = Url::parse(&location_of(&login)).unwrap();
        let state = authorize
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        get_request(router, &format!("/callback?code=c1&state={state}")).await
    }

    #[tokio::test]
    async fn health_reports_unauthenticated_state() {
        let (router, _, _) = test_app().await;
        let response = get_request(&router, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["auth"]["phase"], "unauthenticated");
        assert_eq!(json["auth"]["is_loading"], false);
    }

    #[tokio::test]
    async fn protected_route_redirects_to_login_with_return_url() {
        let (router, _, _) = test_app().await;
        let response = get_request(&router, "/dashboard?tab=2").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            location_of(&response),
            "/login?returnUrl=%2Fdashboard%3Ftab%3D2"
        );
    }

    #[tokio::test]
    async fn login_redirects_to_authorization_server() {
        let (router, _, store) = test_app().await;
        let response = get_request(&router, "/login").await;
        assert_eq!(response.status(), StatusCode::FOUND);

        let authorize = Url::parse(&location_of(&response)).unwrap();
        assert!(authorize.path().ends_with("/oauth/authorize"));
        let query: HashMap<_, _> = authorize.query_pairs().into_owned().collect();
        assert_eq!(query["client_id"], "agent-client");
        assert_eq!(query["redirect_uri"], "http://agent.test/callback");
        assert_eq!(query["code_challenge_method"], "S256");
        assert_eq!(Some(&query["state"]), store.get(StorageKey::OauthState).as_ref());
    }

    #[tokio::test]
    async fn full_sign_in_returns_to_requested_page() {
        let (router, state, _) = test_app().await;

        let callback = sign_in(&router, "/login?returnUrl=%2Fdashboard%3Ftab%3D2").await;
        assert_eq!(callback.status(), StatusCode::FOUND);
        assert_eq!(location_of(&callback), "/dashboard?tab=2");
        assert!(state.session.is_authenticated());
        assert_eq!(
            state.location.current().as_str(),
            "http://agent.test/callback",
            "callback parameters are stripped"
        );

        let page = get_request(&router, "/dashboard").await;
        assert_eq!(page.status(), StatusCode::OK);
        let json = json_body(page).await;
        assert_eq!(json["route"], "dashboard");
        assert_eq!(json["user"]["username"], "grace");
    }

    #[tokio::test]
    async fn sign_in_without_return_url_lands_on_default() {
        let (router, _, _) = test_app().await;
        let callback = sign_in(&router, "/login").await;
        assert_eq!(location_of(&callback), "/dashboard");
    }

    #[tokio::test]
    async fn role_restricted_route_denies_without_role() {
        let (router, _, _) = test_app().await;
        sign_in(&router, "/login").await;

        let response = get_request(&router, "/admin").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location_of(&response), "/access-denied");

        let denied = get_request(&router, "/access-denied").await;
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn login_when_authenticated_skips_authorization_server() {
        let (router, _, _) = test_app().await;
        sign_in(&router, "/login").await;

        let response = get_request(&router, "/login?returnUrl=%2Freports").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location_of(&response), "/reports");
    }

    #[tokio::test]
    async fn forged_callback_state_goes_back_to_login() {
        let (router, state, _) = test_app().await;
        get_request(&router, "/login").await;

        let response = get_request(&router, "/callback?code=c1&state=forged").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location_of(&response), "/login");
        assert!(!state.session.is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let (router, state, store) = test_app().await;
        sign_in(&router, "/login").await;
        assert!(store.get(StorageKey::AccessToken).is_some());

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location_of(&response), "/login");
        assert!(!state.session.is_authenticated());
        assert!(store.is_empty());

        let page = get_request(&router, "/dashboard").await;
        assert_eq!(page.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn page_requests_leave_shared_location_alone() {
        let (router, state, _) = test_app().await;
        let before = state.location.current();

        get_request(&router, "/dashboard?tab=2").await;
        get_request(&router, "/login?returnUrl=%2Fadmin").await;
        assert_eq!(state.location.current(), before);

        // Only the callback reaches the session, which then strips it
        let callback = sign_in(&router, "/login").await;
        assert_eq!(location_of(&callback), "/dashboard");
        assert_eq!(
            state.location.current().as_str(),
            "http://agent.test/callback"
        );
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_prometheus_format() {
        let (router, _, _) = test_app().await;
        let response = get_request(&router, "/metrics").await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
    }

    #[test]
    fn named_redirect_keeps_explicit_params() {
        let config = test_config("http://127.0.0.1:9/oauth");
        let state = AppState::new(
            &config,
            Arc::new(MemoryStore::new()),
            reqwest::Client::new(),
            test_prometheus_handle(),
        )
        .unwrap();
        let requested = Url::parse("http://agent.test/admin").unwrap();

        let verdict = Verdict::RedirectNamed {
            name: "dashboard".into(),
            params: [("tab".to_string(), "1".to_string())].into(),
        };
        assert_eq!(
            state.redirect_target(&verdict, &requested).as_deref(),
            Some("/dashboard?tab=1")
        );
        assert_eq!(
            state
                .redirect_target(&Verdict::redirect_to("access-denied"), &requested)
                .as_deref(),
            Some("/access-denied")
        );
        assert_eq!(state.redirect_target(&Verdict::Allow, &requested), None);
    }
}
