//! HTTP server for the rapsheet records directory.
//!
//! Wraps the [`rapsheet_api`] router with optional Basic auth and request
//! tracing, and owns the server's runtime configuration.

pub mod auth;
pub mod error;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use rapsheet_core::store::RecordAdmin;
use rapsheet_store_sqlite::DEFAULT_CHANGE_CAPACITY;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `RAPSHEET_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Empty disables authentication.
  pub auth_username:      String,
  pub auth_password_hash: String,
  /// Change events buffered per subscriber before it lags.
  pub change_buffer:      usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".to_string(),
      port:               8080,
      store_path:         PathBuf::from("rapsheet.db"),
      auth_username:      String::new(),
      auth_password_hash: String::new(),
      change_buffer:      DEFAULT_CHANGE_CAPACITY,
    }
  }
}

impl ServerConfig {
  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the router needs.
#[derive(Clone)]
pub struct AppState<S> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full server router: `/api/*` behind auth, `/health` open.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordAdmin + 'static,
{
  let api = rapsheet_api::api_router(state.store)
    .layer(middleware::from_fn_with_state(state.auth, require_auth));

  Router::new()
    .nest("/api", api)
    .route("/health", get(|| async { "ok" }))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rapsheet_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state(auth: AuthConfig) -> AppState<SqliteStore> {
    AppState {
      store: Arc::new(SqliteStore::open_in_memory().await.unwrap()),
      auth:  Arc::new(auth),
    }
  }

  fn secured() -> AuthConfig {
    AuthConfig {
      username:      "user".to_string(),
      password_hash: auth::hash_password("secret").unwrap(),
    }
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn get_raw(
    state: AppState<SqliteStore>,
    uri:   &str,
    auth:  Option<String>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(v) = auth {
      builder = builder.header(header::AUTHORIZATION, v);
    }
    router(state)
      .oneshot(builder.body(Body::empty()).unwrap())
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn api_requires_credentials_when_configured() {
    let state = make_state(secured()).await;
    let resp = get_raw(state, "/api/records", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn api_accepts_valid_credentials() {
    let state = make_state(secured()).await;
    let resp =
      get_raw(state, "/api/records", Some(auth_header("user", "secret"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_rejects_wrong_password() {
    let state = make_state(secured()).await;
    let resp =
      get_raw(state, "/api/records", Some(auth_header("user", "nope"))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn api_is_open_without_username() {
    let state = make_state(AuthConfig::default()).await;
    let resp = get_raw(state, "/api/records", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn health_skips_auth() {
    let state = make_state(secured()).await;
    let resp = get_raw(state, "/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[test]
  fn config_defaults_fill_missing_keys() {
    let cfg: ServerConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.change_buffer, DEFAULT_CHANGE_CAPACITY);
    assert!(!cfg.auth().is_enabled());
  }
}
