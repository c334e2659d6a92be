//! Handlers for `/records` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/records` | Optional `?search=..&status=..`, newest first |
//! | `POST`   | `/records` | Body: a `NewRecord`; 409 if the id is taken |
//! | `GET`    | `/records/{id}` | 404 if not found |
//! | `PATCH`  | `/records/{id}/status` | Body: `{"status":"Released"}` |
//! | `DELETE` | `/records/{id}` | 204, or 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use rapsheet_core::{
  filter::{self, RecordQuery},
  record::{NewRecord, Record, Status},
  store::{RecordAdmin, RecordStore},
};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Case-insensitive substring over names, identifier and crimes.
  pub search: Option<String>,
  /// Exact status match, in display form (`On Parole`).
  pub status: Option<String>,
}

impl ListParams {
  fn into_query(self) -> Result<RecordQuery, ApiError> {
    let status = match self.status.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(s) => Some(Status::parse(s).map_err(ApiError::store)?),
    };
    Ok(RecordQuery::new(self.search.unwrap_or_default(), status))
  }
}

/// `GET /records[?search=<text>][&status=<status>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Record>>, ApiError>
where
  S: RecordStore,
{
  let query = params.into_query()?;
  let records = store.list_records().await.map_err(ApiError::store)?;

  if query.is_empty() {
    return Ok(Json(records));
  }
  Ok(Json(filter::apply(&records, &query)))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /records`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewRecord>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let input = body.prepare().map_err(ApiError::store)?;
  let record = store.insert_record(input).await.map_err(ApiError::store)?;
  info!(identifier = %record.identifier, "record created");
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /records/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<Record>, ApiError>
where
  S: RecordStore,
{
  let record = store
    .get_record(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("record {id} not found")))?;
  Ok(Json(record))
}

// ─── Update status ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: String,
}

/// `PATCH /records/{id}/status` with body `{"status":"Incarcerated"}`
pub async fn update_status<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Record>, ApiError>
where
  S: RecordAdmin,
{
  let status = Status::parse(body.status.trim()).map_err(ApiError::store)?;
  let record = store
    .update_status(&id, status)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("record {id} not found")))?;
  info!(identifier = %id, %status, "status updated");
  Ok(Json(record))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /records/{id}`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: RecordAdmin,
{
  if !store.delete_record(&id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("record {id} not found")));
  }
  info!(identifier = %id, "record deleted");
  Ok(StatusCode::NO_CONTENT)
}
