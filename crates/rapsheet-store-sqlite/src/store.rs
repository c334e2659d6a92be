//! [`SqliteStore`]: the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast;
use tracing::debug;

use rapsheet_core::{
  record::{NewRecord, Record, Status},
  store::{ChangeEvent, ChangeKind, RECORDS_TABLE, RecordAdmin, RecordStore},
};

use crate::{
  Error, Result,
  encode::{RawRecord, encode_dt},
  feed::BroadcastFeed,
  schema::{RECORD_COLUMNS, SCHEMA},
};

/// Change events buffered per subscriber before it starts lagging.
pub const DEFAULT_CHANGE_CAPACITY: usize = 256;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A rapsheet store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection and the change channel are
/// reference-counted, and every clone publishes to the same subscribers.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with_capacity(path, DEFAULT_CHANGE_CAPACITY).await
  }

  /// Like [`open`](Self::open), with an explicit change-buffer size.
  pub async fn open_with_capacity(
    path: impl AsRef<Path>,
    change_capacity: usize,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, change_capacity).await
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, DEFAULT_CHANGE_CAPACITY).await
  }

  async fn init(
    conn: tokio_rusqlite::Connection,
    change_capacity: usize,
  ) -> Result<Self> {
    let (changes, _rx) = broadcast::channel(change_capacity.max(1));
    let store = Self { conn, changes };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Announce a committed mutation to every live feed.
  fn publish(&self, kind: ChangeKind) {
    let receivers = self
      .changes
      .send(ChangeEvent::new(RECORDS_TABLE, kind))
      .unwrap_or(0);
    debug!(%kind, receivers, "published change");
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;
  type Feed = BroadcastFeed;

  async fn list_records(&self) -> Result<Vec<Record>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS} FROM records
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn get_record(&self, identifier: &str) -> Result<Option<Record>> {
    let id = identifier.to_owned();

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"),
              rusqlite::params![id],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn insert_record(&self, input: NewRecord) -> Result<Record> {
    input.validate()?;

    let record = input.into_record(Utc::now());
    let row = RawRecord::from_record(&record)?;

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO records (
             id, first_name, last_name, dob, address, status,
             photo_url, last_seen, physical, offenses, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            row.id,
            row.first_name,
            row.last_name,
            row.dob,
            row.address,
            row.status,
            row.photo_url,
            row.last_seen,
            row.physical,
            row.offenses,
            row.created_at,
            row.updated_at,
          ],
        );
        match result {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(
        rapsheet_core::Error::DuplicateIdentifier(record.identifier).into(),
      );
    }

    self.publish(ChangeKind::Insert);
    Ok(record)
  }

  async fn subscribe_to_table_changes(&self, table: &str) -> Result<BroadcastFeed> {
    Ok(BroadcastFeed::new(self.changes.subscribe(), table))
  }
}

// ─── RecordAdmin impl ────────────────────────────────────────────────────────

impl RecordAdmin for SqliteStore {
  async fn update_status(
    &self,
    identifier: &str,
    status: Status,
  ) -> Result<Option<Record>> {
    let id = identifier.to_owned();
    let status_str = status.as_ref().to_owned();
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE records SET status = ?2, updated_at = ?3 WHERE id = ?1",
          rusqlite::params![id, status_str, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.publish(ChangeKind::Update);
    self.get_record(identifier).await
  }

  async fn delete_record(&self, identifier: &str) -> Result<bool> {
    let id = identifier.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM records WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;

    if removed == 0 {
      return Ok(false);
    }
    self.publish(ChangeKind::Delete);
    Ok(true)
  }
}
