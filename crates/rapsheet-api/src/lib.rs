//! JSON REST API for the rapsheet records directory.
//!
//! Exposes an axum [`Router`] backed by any [`rapsheet_core::store::RecordAdmin`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rapsheet_api::api_router(store.clone()))
//! ```

pub mod changes;
pub mod error;
pub mod records;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch},
};
use rapsheet_core::store::RecordAdmin;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RecordAdmin + 'static,
{
  Router::new()
    .route("/records", get(records::list::<S>).post(records::create::<S>))
    .route(
      "/records/{id}",
      get(records::get_one::<S>).delete(records::delete_one::<S>),
    )
    .route("/records/{id}/status", patch(records::update_status::<S>))
    .route("/changes", get(changes::stream::<S>))
    .with_state(store)
}
