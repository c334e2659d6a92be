//! The `RecordStore` trait and its change-notification contract.
//!
//! The trait is implemented by backends (e.g. `rapsheet-store-sqlite`) and by
//! remote clients (`rapsheet-cli`). The synchronizer depends on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::record::{NewRecord, Record, Status};

/// Name of the table every record lives in.
pub const RECORDS_TABLE: &str = "records";

// ─── Change notifications ────────────────────────────────────────────────────

/// What kind of mutation a [`ChangeEvent`] reports.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeKind {
  Insert,
  Update,
  Delete,
  /// Notifications were lost in transit; treat as "something changed".
  Resync,
}

/// "A row in `table` changed." Carries no row data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub table: String,
  pub kind:  ChangeKind,
}

impl ChangeEvent {
  pub fn new(table: impl Into<String>, kind: ChangeKind) -> Self {
    Self { table: table.into(), kind }
  }
}

/// A live subscription to change notifications on one table.
///
/// Dropping the feed unsubscribes.
pub trait ChangeFeed: Send {
  /// Wait for the next change. Returns `None` once the backend closes the
  /// feed; no further events follow.
  fn next(&mut self) -> impl Future<Output = Option<ChangeEvent>> + Send + '_;
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Abstraction over a rapsheet backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
  type Feed: ChangeFeed + 'static;

  /// Every record, newest `created_at` first.
  fn list_records(
    &self,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + '_;

  /// Retrieve a record by identifier. Returns `None` if not found.
  fn get_record<'a>(
    &'a self,
    identifier: &'a str,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + 'a;

  /// Persist a new record and return it with backend-assigned timestamps.
  ///
  /// Fails if the identifier is taken or required fields are absent.
  fn insert_record(
    &self,
    input: NewRecord,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + '_;

  /// Start receiving change notifications for `table`.
  fn subscribe_to_table_changes<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<Self::Feed, Self::Error>> + Send + 'a;
}

/// Backend-side mutation paths. Clients never call these; they only observe
/// the resulting change notifications.
pub trait RecordAdmin: RecordStore {
  /// Change a record's status. Returns `None` if the record does not exist.
  fn update_status<'a>(
    &'a self,
    identifier: &'a str,
    status: Status,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + 'a;

  /// Remove a record. Returns `false` if it did not exist.
  fn delete_record<'a>(
    &'a self,
    identifier: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
