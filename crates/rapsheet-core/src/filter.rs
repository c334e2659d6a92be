//! The filter engine: derives the displayed list from the base list.
//!
//! Filtering is a stable, linear pass; the result always preserves the
//! relative order of the base list.

use serde::{Deserialize, Serialize};

use crate::record::{Record, Status};

/// The active search term and status filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
  /// Case-insensitive substring matched against names, identifier and
  /// offense crimes. Empty matches everything.
  #[serde(default)]
  pub search: String,
  /// Exact status to keep. `None` matches everything.
  #[serde(default)]
  pub status: Option<Status>,
}

impl RecordQuery {
  pub fn new(search: impl Into<String>, status: Option<Status>) -> Self {
    Self { search: search.into(), status }
  }

  pub fn is_empty(&self) -> bool {
    self.search.is_empty() && self.status.is_none()
  }

  /// Whether `record` satisfies both the search and the status condition.
  pub fn matches(&self, record: &Record) -> bool {
    Matcher::new(self).matches(record)
  }
}

/// A query with its search term case-folded once up front.
struct Matcher {
  needle: String,
  status: Option<Status>,
}

impl Matcher {
  fn new(query: &RecordQuery) -> Self {
    Self { needle: query.search.to_lowercase(), status: query.status }
  }

  fn matches(&self, record: &Record) -> bool {
    self.matches_search(record) && self.matches_status(record)
  }

  fn matches_search(&self, record: &Record) -> bool {
    if self.needle.is_empty() {
      return true;
    }
    let hit = |field: &str| field.to_lowercase().contains(&self.needle);
    hit(&record.first_name)
      || hit(&record.last_name)
      || hit(&record.identifier)
      || record.offenses.iter().any(|o| hit(&o.crime))
  }

  fn matches_status(&self, record: &Record) -> bool {
    self.status.is_none_or(|s| s == record.status)
  }
}

/// Return the records of `base` that match `query`, in base order.
pub fn apply(base: &[Record], query: &RecordQuery) -> Vec<Record> {
  let matcher = Matcher::new(query);
  base.iter().filter(|r| matcher.matches(r)).cloned().collect()
}
