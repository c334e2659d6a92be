//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by the core error somewhere in its source
  /// chain. Anything unrecognised is an internal store failure.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    use rapsheet_core::Error as Core;

    let classified =
      Core::find_in(&err).and_then(|core| match core {
        Core::DuplicateIdentifier(_) => Some(Self::Conflict(core.to_string())),
        core if core.is_validation() => Some(Self::BadRequest(core.to_string())),
        _ => None,
      });
    classified.unwrap_or_else(|| Self::Store(Box::new(err)))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use rapsheet_core::Error as Core;

  use super::*;

  #[derive(Debug, Error)]
  #[error("backend: {0}")]
  struct Wrapped(#[source] Core);

  #[test]
  fn classifies_through_source_chain() {
    let dup = ApiError::store(Wrapped(Core::DuplicateIdentifier("A1".into())));
    assert!(matches!(dup, ApiError::Conflict(_)));

    let missing = ApiError::store(Wrapped(Core::MissingField("last_name")));
    assert!(matches!(missing, ApiError::BadRequest(ref m) if m.contains("last_name")));

    let bad_status = ApiError::store(Core::UnknownStatus("Missing".into()));
    assert_eq!(bad_status.into_response().status(), StatusCode::BAD_REQUEST);

    let fetch = ApiError::store(Core::Fetch(Box::new(std::io::Error::other("down"))));
    assert!(matches!(fetch, ApiError::Store(_)));
  }

  #[test]
  fn unknown_errors_are_internal() {
    let io = std::io::Error::other("disk on fire");
    let err = ApiError::store(io);
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
