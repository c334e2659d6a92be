//! Handler for `GET /changes`: a Server-Sent-Events stream of change
//! notifications.
//!
//! Each event carries the change kind as its `event:` name and the JSON
//! [`ChangeEvent`] as its `data:`. Events hold no row data; clients refetch.

use std::{convert::Infallible, sync::Arc};

use axum::{
  extract::{Query, State},
  response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, stream};
use rapsheet_core::store::{ChangeEvent, ChangeFeed, RECORDS_TABLE, RecordStore};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ChangesParams {
  #[serde(default = "default_table")]
  pub table: String,
}

fn default_table() -> String { RECORDS_TABLE.to_owned() }

/// `GET /changes[?table=records]`
pub async fn stream<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ChangesParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError>
where
  S: RecordStore,
{
  let feed = store
    .subscribe_to_table_changes(&params.table)
    .await
    .map_err(ApiError::store)?;
  info!(table = %params.table, "change stream opened");

  let events = stream::unfold(feed, |mut feed| async move {
    let change = feed.next().await?;
    debug!(table = %change.table, kind = %change.kind, "forwarding change");
    Some((Ok(to_event(&change)), feed))
  });

  Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_event(change: &ChangeEvent) -> Event {
  let event = Event::default().event(change.kind.as_ref());
  match event.json_data(change) {
    Ok(event) => event,
    Err(e) => {
      warn!(error = %e, "failed to encode change event");
      Event::default().event(change.kind.as_ref())
    }
  }
}
