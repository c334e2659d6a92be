//! [`Synchronizer`]: keeps the in-memory base list in step with the backend.
//!
//! The base list is only ever replaced wholesale by a successful
//! [`Synchronizer::refresh`]. Change notifications from the backend trigger
//! one full refresh each; no delta is ever applied locally.
//!
//! # Overlapping refreshes
//!
//! Every refresh takes a ticket from a monotonically increasing counter when
//! it is issued. The response is applied only if its ticket is newer than the
//! ticket of the snapshot currently held, so a slow, older response can never
//! overwrite a newer one.

use std::sync::{
  Arc,
  atomic::{AtomicU64, Ordering},
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  record::{NewRecord, Record},
  store::{ChangeFeed, RECORDS_TABLE, RecordStore},
};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// An immutable base list together with the ticket of the refresh that
/// produced it. Generation `0` is the empty list before any refresh.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
  pub records:    Arc<Vec<Record>>,
  pub generation: u64,
}

/// What happened to a successful fetch.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
  /// The response became the new base list.
  Applied(Snapshot),
  /// A newer refresh had already been applied; this response was dropped.
  Stale { ticket: u64, current: u64 },
}

impl RefreshOutcome {
  pub fn is_applied(&self) -> bool { matches!(self, Self::Applied(_)) }
}

// ─── Synchronizer ────────────────────────────────────────────────────────────

/// Sole owner and writer of the base list.
pub struct Synchronizer<S: RecordStore> {
  store:   Arc<S>,
  tx:      watch::Sender<Snapshot>,
  tickets: AtomicU64,
}

impl<S: RecordStore> Synchronizer<S> {
  /// Create a synchronizer with an empty base list. Call
  /// [`refresh`](Self::refresh) to load it.
  pub fn new(store: Arc<S>) -> Self {
    let (tx, _rx) = watch::channel(Snapshot::default());
    Self { store, tx, tickets: AtomicU64::new(0) }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// The current base list.
  pub fn snapshot(&self) -> Snapshot { self.tx.borrow().clone() }

  /// A receiver that observes every applied base-list replacement.
  pub fn watch(&self) -> watch::Receiver<Snapshot> { self.tx.subscribe() }

  /// Fetch every record and, unless a newer refresh already landed, replace
  /// the base list with the result.
  ///
  /// On failure the base list is left untouched and [`Error::Fetch`] is
  /// returned.
  pub async fn refresh(&self) -> Result<RefreshOutcome> {
    let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;

    let records = match self.store.list_records().await {
      Ok(records) => records,
      Err(e) => {
        warn!(ticket, error = %e, "error fetching records; keeping previous list");
        return Err(Error::Fetch(Box::new(e)));
      }
    };

    let count = records.len();
    let records = Arc::new(records);
    let mut applied = None;
    self.tx.send_if_modified(|current| {
      if ticket <= current.generation {
        return false;
      }
      *current = Snapshot { records: Arc::clone(&records), generation: ticket };
      applied = Some(current.clone());
      true
    });

    match applied {
      Some(snapshot) => {
        debug!(ticket, count, "applied refresh");
        Ok(RefreshOutcome::Applied(snapshot))
      }
      None => {
        let current = self.tx.borrow().generation;
        debug!(ticket, current, "discarded stale refresh");
        Ok(RefreshOutcome::Stale { ticket, current })
      }
    }
  }

  /// Validate and submit a new record, then refresh on success.
  ///
  /// Validation failures are returned as-is; backend failures become
  /// [`Error::Insert`]. Neither touches the base list.
  pub async fn insert(&self, input: NewRecord) -> Result<Record> {
    let input = input.prepare()?;
    let identifier = input.identifier.clone();

    let record = self.store.insert_record(input).await.map_err(|e| {
      warn!(%identifier, error = %e, "error saving record");
      Error::Insert(Box::new(e))
    })?;
    info!(%identifier, "record saved");

    // A failed refresh is already logged; the insert itself succeeded.
    let _ = self.refresh().await;
    Ok(record)
  }

  /// Stop a subscription. Equivalent to [`Subscription::unsubscribe`].
  pub async fn unsubscribe(&self, handle: Subscription) { handle.unsubscribe().await }
}

impl<S: RecordStore + 'static> Synchronizer<S> {
  /// Listen for changes to the records table. Each notification triggers
  /// exactly one [`refresh`](Self::refresh); `on_change` is called with the
  /// new snapshot whenever that refresh is applied.
  pub async fn subscribe<F>(self: &Arc<Self>, on_change: F) -> Result<Subscription>
  where
    F: Fn(&Snapshot) + Send + 'static,
  {
    let mut feed = self
      .store
      .subscribe_to_table_changes(RECORDS_TABLE)
      .await
      .map_err(|e| Error::Subscribe(Box::new(e)))?;

    let this = Arc::clone(self);
    let task = tokio::spawn(async move {
      while let Some(event) = feed.next().await {
        debug!(table = %event.table, kind = %event.kind, "change notification");
        if let Ok(RefreshOutcome::Applied(snapshot)) = this.refresh().await {
          on_change(&snapshot);
        }
      }
      info!("change feed closed");
    });

    info!(table = RECORDS_TABLE, "subscribed to changes");
    Ok(Subscription { task })
  }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// Handle to a running change subscription.
///
/// Dropping it cancels the listener; [`unsubscribe`](Self::unsubscribe) also
/// waits until the listener has fully stopped.
#[derive(Debug)]
pub struct Subscription {
  task: JoinHandle<()>,
}

impl Subscription {
  /// Cancel the listener and release the change feed. Once this returns, the
  /// `on_change` callback will not be invoked again.
  pub async fn unsubscribe(mut self) {
    self.task.abort();
    let _ = (&mut self.task).await;
    debug!("unsubscribed from changes");
  }

  /// `true` once the listener has stopped, e.g. because the feed closed.
  pub fn is_finished(&self) -> bool { self.task.is_finished() }
}

impl Drop for Subscription {
  fn drop(&mut self) { self.task.abort(); }
}
