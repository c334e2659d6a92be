//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! The physical description and the offense list are stored as compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use rapsheet_core::record::{Record, Status};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// The column holds the display form (`"On Parole"`), written with
/// `status.as_ref()`.
pub fn decode_status(s: &str) -> Result<Status> { Ok(Status::parse(s)?) }

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw strings read directly from a `records` row.
pub struct RawRecord {
  pub id:         String,
  pub first_name: String,
  pub last_name:  String,
  pub dob:        String,
  pub address:    String,
  pub status:     String,
  pub photo_url:  String,
  pub last_seen:  String,
  pub physical:   String,
  pub offenses:   String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawRecord {
  /// Read a row selected with [`crate::schema::RECORD_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      first_name: row.get(1)?,
      last_name:  row.get(2)?,
      dob:        row.get(3)?,
      address:    row.get(4)?,
      status:     row.get(5)?,
      photo_url:  row.get(6)?,
      last_seen:  row.get(7)?,
      physical:   row.get(8)?,
      offenses:   row.get(9)?,
      created_at: row.get(10)?,
      updated_at: row.get(11)?,
    })
  }

  pub fn from_record(record: &Record) -> Result<Self> {
    Ok(Self {
      id:         record.identifier.clone(),
      first_name: record.first_name.clone(),
      last_name:  record.last_name.clone(),
      dob:        record.date_of_birth.clone(),
      address:    record.address.clone(),
      status:     record.status.as_ref().to_owned(),
      photo_url:  record.photo_url.clone(),
      last_seen:  record.last_seen.clone(),
      physical:   serde_json::to_string(&record.physical)?,
      offenses:   serde_json::to_string(&record.offenses)?,
      created_at: encode_dt(record.created_at),
      updated_at: encode_dt(record.updated_at),
    })
  }

  pub fn into_record(self) -> Result<Record> {
    Ok(Record {
      identifier:    self.id,
      first_name:    self.first_name,
      last_name:     self.last_name,
      date_of_birth: self.dob,
      address:       self.address,
      status:        decode_status(&self.status)?,
      photo_url:     self.photo_url,
      last_seen:     self.last_seen,
      physical:      serde_json::from_str(&self.physical)?,
      offenses:      serde_json::from_str(&self.offenses)?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let early = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let late = early + chrono::Duration::milliseconds(1500);
    assert!(encode_dt(early) < encode_dt(late));
    assert_eq!(decode_dt(&encode_dt(late)).unwrap(), late);
  }

  #[test]
  fn status_column_matches_wire_form() {
    assert_eq!(Status::OnParole.as_ref(), "On Parole");
    for status in [Status::Incarcerated, Status::OnParole, Status::Released, Status::Wanted] {
      assert_eq!(decode_status(status.as_ref()).unwrap(), status);
    }
    assert!(decode_status("Missing").is_err());
  }
}
