//! Mock authorization server and session builders shared by the tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use navigation::location::MemoryLocation;
use oauth_client::{AuthConfig, AuthServerClient, CredentialStore, MemoryStore, now_millis};
use tokio::net::TcpListener;
use url::Url;

use crate::session::AuthSession;

/// Unsigned JWT whose payload carries `exp` (seconds).
pub fn jwt_with_exp(exp_secs: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{exp_secs}}}"#));
    format!("{header}.{payload}.sig")
}

pub fn fresh_jwt() -> String {
    jwt_with_exp(now_millis() / 1000 + 3600)
}

pub fn expired_jwt() -> String {
    jwt_with_exp(now_millis() / 1000 - 60)
}

struct Behaviour {
    introspect_active: bool,
    token_status: Option<u16>,
    logout_status: Option<u16>,
    token_forms: Vec<HashMap<String, String>>,
    revoke_forms: Vec<HashMap<String, String>>,
    logout_calls: usize,
}

type Shared = Arc<Mutex<Behaviour>>;

fn status(code: Option<u16>) -> StatusCode {
    code.and_then(|c| StatusCode::from_u16(c).ok())
        .unwrap_or(StatusCode::OK)
}

/// Authorization server on an ephemeral port under `/oauth`.
pub struct MockServer {
    base: Url,
    shared: Shared,
}

impl MockServer {
    pub async fn start() -> Self {
        let shared: Shared = Arc::new(Mutex::new(Behaviour {
            introspect_active: true,
            token_status: None,
            logout_status: None,
            token_forms: Vec::new(),
            revoke_forms: Vec::new(),
            logout_calls: 0,
        }));

        let app = Router::new()
            .route(
                "/oauth/token",
                post(
                    |State(shared): State<Shared>,
                     Form(form): Form<HashMap<String, String>>| async move {
                        let mut b = shared.lock().unwrap();
                        b.token_forms.push(form);
                        let body = match b.token_status {
                            Some(_) => serde_json::json!({ "error": "invalid_grant" }),
                            None => serde_json::json!({
                                "access_token": fresh_jwt(),
                                "refresh_token": "rt_new",
                                "expires_in": 3600
                            }),
                        };
                        (
                            status(b.token_status),
                            [(CONTENT_TYPE, "application/json")],
                            body.to_string(),
                        )
                    },
                ),
            )
            .route(
                "/oauth/introspect",
                post(|State(shared): State<Shared>| async move {
                    let active = shared.lock().unwrap().introspect_active;
                    Json(serde_json::json!({ "active": active }))
                }),
            )
            .route(
                "/oauth/userinfo",
                get(|| async {
                    Json(serde_json::json!({
                        "id": "u1",
                        "username": "ada",
                        "email": "ada@example.test",
                        "roles": ["admin", "user"]
                    }))
                }),
            )
            .route(
                "/oauth/logout",
                post(|State(shared): State<Shared>| async move {
                    let mut b = shared.lock().unwrap();
                    b.logout_calls += 1;
                    status(b.logout_status)
                }),
            )
            .route(
                "/oauth/revoke",
                post(
                    |State(shared): State<Shared>,
                     Form(form): Form<HashMap<String, String>>| async move {
                        shared.lock().unwrap().revoke_forms.push(form);
                        StatusCode::OK
                    },
                ),
            )
            .with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self {
            base: Url::parse(&format!("http://{addr}/oauth")).unwrap(),
            shared,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn set_introspect_active(&self, active: bool) {
        self.shared.lock().unwrap().introspect_active = active;
    }

    pub fn set_token_status(&self, code: u16) {
        self.shared.lock().unwrap().token_status = Some(code);
    }

    pub fn set_logout_status(&self, code: u16) {
        self.shared.lock().unwrap().logout_status = Some(code);
    }

    pub fn token_requests(&self) -> usize {
        self.shared.lock().unwrap().token_forms.len()
    }

    pub fn grant_types(&self) -> Vec<String> {
        self.form_values(|b| &b.token_forms, "grant_type")
    }

    pub fn exchanged_codes(&self) -> Vec<String> {
        self.form_values(|b| &b.token_forms, "code")
    }

    pub fn revoked_tokens(&self) -> Vec<String> {
        self.form_values(|b| &b.revoke_forms, "token")
    }

    pub fn logout_calls(&self) -> usize {
        self.shared.lock().unwrap().logout_calls
    }

    fn form_values(
        &self,
        forms: impl Fn(&Behaviour) -> &Vec<HashMap<String, String>>,
        field: &str,
    ) -> Vec<String> {
        let b = self.shared.lock().unwrap();
        forms(&b)
            .iter()
            .filter_map(|f| f.get(field).cloned())
            .collect()
    }
}

fn config_for(server_url: &str) -> AuthConfig {
    AuthConfig::new(
        "test-client",
        Url::parse("http://app.test/callback").unwrap(),
        Url::parse(server_url).unwrap(),
    )
}

fn build(
    config: AuthConfig,
    current_url: &str,
    store: Arc<MemoryStore>,
) -> (Arc<AuthSession>, Arc<MemoryLocation>) {
    let store: Arc<dyn CredentialStore> = store;
    let client = AuthServerClient::new(Arc::new(config), store, reqwest::Client::new());
    let location = Arc::new(MemoryLocation::new(Url::parse(current_url).unwrap()));
    let session = AuthSession::new(client, location.clone()).unwrap();
    (Arc::new(session), location)
}

/// Session against `server` whose page is currently `current_url`.
pub fn session_at(
    server: &MockServer,
    current_url: &str,
    store: Arc<MemoryStore>,
) -> (Arc<AuthSession>, Arc<MemoryLocation>) {
    build(config_for(server.base().as_str()), current_url, store)
}

pub fn session_with_config(
    server: &MockServer,
    current_url: &str,
    store: Arc<MemoryStore>,
    customize: impl FnOnce(AuthConfig) -> AuthConfig,
) -> (Arc<AuthSession>, Arc<MemoryLocation>) {
    build(
        customize(config_for(server.base().as_str())),
        current_url,
        store,
    )
}

pub fn session_with_server_url(
    server_url: &str,
    current_url: &str,
    store: Arc<MemoryStore>,
) -> (Arc<AuthSession>, Arc<MemoryLocation>) {
    build(config_for(server_url), current_url, store)
}
