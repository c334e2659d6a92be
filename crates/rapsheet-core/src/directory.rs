//! [`Directory`]: the owned "base list + active filters" view state.
//!
//! A consumer holds one `Directory`. Every mutation entry point recomputes the
//! displayed list, so it is never stale relative to its inputs.

use std::sync::Arc;

use crate::{
  filter::{RecordQuery, apply},
  record::{Record, Status},
  sync::Snapshot,
};

#[derive(Debug, Clone, Default)]
pub struct Directory {
  base:      Arc<Vec<Record>>,
  query:     RecordQuery,
  displayed: Vec<Record>,
}

impl Directory {
  pub fn new() -> Self { Self::default() }

  /// Start from an existing synchronizer snapshot.
  pub fn from_snapshot(snapshot: &Snapshot) -> Self {
    let mut dir = Self::new();
    dir.replace_base(snapshot);
    dir
  }

  // ── Mutation entry points ─────────────────────────────────────────────────

  /// Swap in a freshly synchronized base list, keeping the active filters.
  pub fn replace_base(&mut self, snapshot: &Snapshot) {
    self.base = Arc::clone(&snapshot.records);
    self.recompute();
  }

  pub fn set_search(&mut self, search: impl Into<String>) {
    let search = search.into();
    if search != self.query.search {
      self.query.search = search;
      self.recompute();
    }
  }

  pub fn set_status(&mut self, status: Option<Status>) {
    if status != self.query.status {
      self.query.status = status;
      self.recompute();
    }
  }

  pub fn clear_filters(&mut self) {
    if !self.query.is_empty() {
      self.query = RecordQuery::default();
      self.recompute();
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn base(&self) -> &[Record] { &self.base }

  pub fn query(&self) -> &RecordQuery { &self.query }

  pub fn displayed(&self) -> &[Record] { &self.displayed }

  /// Human-readable message for an empty displayed list, mirroring whether
  /// the emptiness comes from the filters or from the directory itself.
  pub fn empty_hint(&self) -> Option<&'static str> {
    if !self.displayed.is_empty() {
      None
    } else if self.query.is_empty() {
      Some("No records in the database.")
    } else {
      Some("No records found matching your criteria.")
    }
  }

  fn recompute(&mut self) { self.displayed = apply(&self.base, &self.query); }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::record::NewRecord;

  fn snapshot(records: Vec<Record>, generation: u64) -> Snapshot {
    Snapshot { records: Arc::new(records), generation }
  }

  fn rec(id: &str, first: &str, status: Status) -> Record {
    NewRecord::new(id, first, "Doe", status).into_record(Utc::now())
  }

  #[test]
  fn replacing_base_keeps_active_filters() {
    let mut dir = Directory::from_snapshot(&snapshot(
      vec![rec("A1", "Jane", Status::Wanted)],
      1,
    ));
    dir.set_status(Some(Status::Wanted));
    assert_eq!(dir.displayed().len(), 1);

    dir.replace_base(&snapshot(
      vec![
        rec("C3", "Carl", Status::Released),
        rec("B2", "Bob", Status::Wanted),
        rec("A1", "Jane", Status::Wanted),
      ],
      2,
    ));

    let ids: Vec<_> = dir.displayed().iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(ids, ["B2", "A1"]);
    assert_eq!(dir.query().status, Some(Status::Wanted));
  }

  #[test]
  fn empty_hint_distinguishes_filtered_from_empty() {
    let mut dir = Directory::new();
    assert_eq!(dir.empty_hint(), Some("No records in the database."));

    dir.replace_base(&snapshot(vec![rec("A1", "Jane", Status::Wanted)], 1));
    assert_eq!(dir.empty_hint(), None);

    dir.set_search("zzz");
    assert_eq!(
      dir.empty_hint(),
      Some("No records found matching your criteria.")
    );

    dir.clear_filters();
    assert_eq!(dir.displayed().len(), 1);
  }
}
