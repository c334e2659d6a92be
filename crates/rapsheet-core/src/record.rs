//! Record types: the single entity of the rapsheet directory.
//!
//! Field names follow the wire format of the `records` table (`id`, `dob`),
//! so a [`Record`] serialises to exactly the row shape the backend returns.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Error, Result};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Custody status of a person on record.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
pub enum Status {
  Incarcerated,
  #[serde(rename = "On Parole")]
  #[strum(serialize = "On Parole")]
  OnParole,
  Released,
  Wanted,
}

impl Status {
  /// Parse the display form (`"On Parole"`, `"Wanted"`, …).
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
  }
}

/// How serious an offense is.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
pub enum Severity {
  #[default]
  Low,
  Medium,
  High,
  Critical,
}

impl Severity {
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownSeverity(s.to_owned()))
  }
}

// ─── Sub-records ─────────────────────────────────────────────────────────────

/// Physical description; every field is optional free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalDescription {
  #[serde(default)]
  pub height: Option<String>,
  #[serde(default)]
  pub weight: Option<String>,
  #[serde(default)]
  pub hair:   Option<String>,
  #[serde(default)]
  pub eyes:   Option<String>,
}

/// A single entry in a record's offense history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offense {
  pub crime:    String,
  pub date:     NaiveDate,
  pub severity: Severity,
}

/// An offense as entered by a user, before composition.
///
/// `crime` and `date` may be blank; blank entries are dropped by
/// [`compose_offenses`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffenseDraft {
  #[serde(default)]
  pub crime:    String,
  #[serde(default)]
  pub date:     String,
  #[serde(default)]
  pub severity: Severity,
}

impl OffenseDraft {
  pub fn new(
    crime: impl Into<String>,
    date: impl Into<String>,
    severity: Severity,
  ) -> Self {
    Self { crime: crime.into(), date: date.into(), severity }
  }
}

/// Turn user-entered offense drafts into the stored offense list.
///
/// Drafts missing a crime or a date are dropped without error. The remainder
/// is sorted by calendar date, most recent first; entries on the same date
/// keep their entry order.
pub fn compose_offenses(
  drafts: impl IntoIterator<Item = OffenseDraft>,
) -> Result<Vec<Offense>> {
  let mut offenses = drafts
    .into_iter()
    .filter_map(|d| {
      let crime = d.crime.trim();
      let date = d.date.trim();
      if crime.is_empty() || date.is_empty() {
        return None;
      }
      Some(
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
          .map_err(|_| Error::InvalidDate(date.to_owned()))
          .map(|date| Offense {
            crime: crime.to_owned(),
            date,
            severity: d.severity,
          }),
      )
    })
    .collect::<Result<Vec<_>>>()?;

  offenses.sort_by(|a, b| b.date.cmp(&a.date));
  Ok(offenses)
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A criminal record as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  /// User-supplied person number; unique across the directory.
  #[serde(rename = "id")]
  pub identifier:    String,
  pub first_name:    String,
  pub last_name:     String,
  #[serde(rename = "dob", default)]
  pub date_of_birth: String,
  #[serde(default)]
  pub address:       String,
  pub status:        Status,
  #[serde(default)]
  pub photo_url:     String,
  #[serde(default)]
  pub last_seen:     String,
  #[serde(default)]
  pub physical:      PhysicalDescription,
  /// Most recent first.
  #[serde(default)]
  pub offenses:      Vec<Offense>,
  /// Backend-assigned.
  pub created_at:    DateTime<Utc>,
  /// Backend-assigned.
  pub updated_at:    DateTime<Utc>,
}

impl Record {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }

  /// Crime of the most recent offense, or `"N/A"`.
  pub fn most_recent_offense(&self) -> &str {
    self
      .offenses
      .first()
      .map(|o| o.crime.as_str())
      .unwrap_or("N/A")
  }

  /// The stored photo URL, or a generated initials placeholder.
  pub fn photo_url_or_placeholder(&self) -> String {
    if self.photo_url.is_empty() {
      placeholder_photo_url(&self.first_name, &self.last_name)
    } else {
      self.photo_url.clone()
    }
  }
}

/// Initials placeholder image used when no photo URL is on file.
pub fn placeholder_photo_url(first_name: &str, last_name: &str) -> String {
  let initial = |s: &str| s.chars().next().map(String::from).unwrap_or_default();
  format!(
    "https://placehold.co/400x400/6b7280/ffffff?text={}{}",
    initial(first_name),
    initial(last_name)
  )
}

/// `true` if `id` is non-empty and made only of ASCII letters, digits and `-`.
pub fn is_valid_identifier(id: &str) -> bool {
  !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

// ─── NewRecord ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::insert_record`].
/// `created_at` and `updated_at` are always set by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
  #[serde(rename = "id")]
  pub identifier:    String,
  pub first_name:    String,
  pub last_name:     String,
  #[serde(rename = "dob", default)]
  pub date_of_birth: String,
  #[serde(default)]
  pub address:       String,
  pub status:        Status,
  #[serde(default)]
  pub photo_url:     String,
  #[serde(default)]
  pub last_seen:     String,
  #[serde(default)]
  pub physical:      PhysicalDescription,
  #[serde(default)]
  pub offenses:      Vec<Offense>,
}

impl NewRecord {
  /// Convenience constructor with all optional fields left empty.
  pub fn new(
    identifier: impl Into<String>,
    first_name: impl Into<String>,
    last_name: impl Into<String>,
    status: Status,
  ) -> Self {
    Self {
      identifier: identifier.into(),
      first_name: first_name.into(),
      last_name: last_name.into(),
      date_of_birth: String::new(),
      address: String::new(),
      status,
      photo_url: String::new(),
      last_seen: String::new(),
      physical: PhysicalDescription::default(),
      offenses: Vec::new(),
    }
  }

  /// Attach offenses composed from user drafts (see [`compose_offenses`]).
  pub fn with_offense_drafts(
    mut self,
    drafts: impl IntoIterator<Item = OffenseDraft>,
  ) -> Result<Self> {
    self.offenses = compose_offenses(drafts)?;
    Ok(self)
  }

  /// Check the fields the backend requires.
  pub fn validate(&self) -> Result<()> {
    if self.identifier.trim().is_empty() {
      return Err(Error::MissingField("id"));
    }
    if !is_valid_identifier(&self.identifier) {
      return Err(Error::InvalidIdentifier(self.identifier.clone()));
    }
    if self.first_name.trim().is_empty() {
      return Err(Error::MissingField("first_name"));
    }
    if self.last_name.trim().is_empty() {
      return Err(Error::MissingField("last_name"));
    }
    Ok(())
  }

  /// Submission-time normalisation: trim text fields, drop offenses without
  /// a crime, order offenses most recent first, fill in the placeholder
  /// photo, then validate.
  pub fn prepare(mut self) -> Result<Self> {
    for field in [
      &mut self.identifier,
      &mut self.first_name,
      &mut self.last_name,
      &mut self.date_of_birth,
      &mut self.address,
      &mut self.photo_url,
      &mut self.last_seen,
    ] {
      let trimmed = field.trim();
      if trimmed.len() != field.len() {
        *field = trimmed.to_owned();
      }
    }
    self.offenses.retain_mut(|o| {
      let crime = o.crime.trim();
      if crime.len() != o.crime.len() {
        o.crime = crime.to_owned();
      }
      !o.crime.is_empty()
    });
    self.offenses.sort_by(|a, b| b.date.cmp(&a.date));
    self.validate()?;
    if self.photo_url.is_empty() {
      self.photo_url = placeholder_photo_url(&self.first_name, &self.last_name);
    }
    Ok(self)
  }

  /// Build the stored record, stamping both timestamps with `at`.
  pub fn into_record(self, at: DateTime<Utc>) -> Record {
    Record {
      identifier:    self.identifier,
      first_name:    self.first_name,
      last_name:     self.last_name,
      date_of_birth: self.date_of_birth,
      address:       self.address,
      status:        self.status,
      photo_url:     self.photo_url,
      last_seen:     self.last_seen,
      physical:      self.physical,
      offenses:      self.offenses,
      created_at:    at,
      updated_at:    at,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

  #[test]
  fn status_wire_form_matches_display() {
    assert_eq!(Status::OnParole.to_string(), "On Parole");
    assert_eq!(
      serde_json::to_string(&Status::OnParole).unwrap(),
      "\"On Parole\""
    );
    assert_eq!(Status::parse("On Parole").unwrap(), Status::OnParole);
    assert!(matches!(
      Status::parse("on parole"),
      Err(Error::UnknownStatus(s)) if s == "on parole"
    ));
  }

  #[test]
  fn compose_drops_incomplete_and_sorts_descending() {
    let offenses = compose_offenses([
      OffenseDraft::new("Theft", "2021-01-01", Severity::Low),
      OffenseDraft::new("Assault", "2023-05-05", Severity::High),
      OffenseDraft::new("", "2022-01-01", Severity::Medium),
    ])
    .unwrap();

    assert_eq!(offenses, vec![
      Offense {
        crime:    "Assault".into(),
        date:     date("2023-05-05"),
        severity: Severity::High,
      },
      Offense {
        crime:    "Theft".into(),
        date:     date("2021-01-01"),
        severity: Severity::Low,
      },
    ]);
  }

  #[test]
  fn compose_compares_calendar_dates_not_strings() {
    // Unpadded months would sort wrongly as strings.
    let offenses = compose_offenses([
      OffenseDraft::new("Fraud", "2020-9-30", Severity::Low),
      OffenseDraft::new("Arson", "2020-10-01", Severity::Critical),
    ])
    .unwrap();
    assert_eq!(offenses[0].crime, "Arson");
    assert_eq!(offenses[1].crime, "Fraud");
  }

  #[test]
  fn compose_treats_whitespace_as_missing() {
    let offenses = compose_offenses([
      OffenseDraft::new("   ", "2020-01-01", Severity::Low),
      OffenseDraft::new("Burglary", "  ", Severity::Low),
    ])
    .unwrap();
    assert!(offenses.is_empty());
  }

  #[test]
  fn compose_rejects_malformed_date() {
    let err = compose_offenses([OffenseDraft::new(
      "Theft",
      "last tuesday",
      Severity::Low,
    )])
    .unwrap_err();
    assert!(matches!(err, Error::InvalidDate(d) if d == "last tuesday"));
  }

  #[test]
  fn validate_requires_names_and_identifier() {
    let ok = NewRecord::new("1234-5678", "Jane", "Doe", Status::Wanted);
    assert!(ok.validate().is_ok());

    let mut missing = ok.clone();
    missing.first_name = " ".into();
    assert!(matches!(
      missing.validate(),
      Err(Error::MissingField("first_name"))
    ));

    let bad_id = NewRecord::new("12 34", "Jane", "Doe", Status::Wanted);
    assert!(matches!(bad_id.validate(), Err(Error::InvalidIdentifier(_))));
  }

  #[test]
  fn prepare_fills_placeholder_photo() {
    let rec = NewRecord::new(" A1 ", "Jane", "Doe", Status::Wanted)
      .prepare()
      .unwrap();
    assert_eq!(rec.identifier, "A1");
    assert_eq!(
      rec.photo_url,
      "https://placehold.co/400x400/6b7280/ffffff?text=JD"
    );
  }

  #[test]
  fn prepare_drops_blank_offenses_and_sorts_descending() {
    let mut input = NewRecord::new("A1", "Jane", "Doe", Status::Wanted);
    input.offenses = vec![
      Offense { crime: "Theft".into(), date: date("2021-01-01"), severity: Severity::Low },
      Offense { crime: " Assault ".into(), date: date("2023-05-05"), severity: Severity::High },
      Offense { crime: "  ".into(), date: date("2022-01-01"), severity: Severity::Medium },
      Offense { crime: "Fraud".into(), date: date("2021-01-01"), severity: Severity::Medium },
    ];

    let crimes: Vec<_> = input
      .prepare()
      .unwrap()
      .offenses
      .into_iter()
      .map(|o| o.crime)
      .collect();
    assert_eq!(crimes, ["Assault", "Theft", "Fraud"]);
  }

  #[test]
  fn record_deserialises_from_row_shape() {
    let json = serde_json::json!({
      "id": "A1",
      "first_name": "Jane",
      "last_name": "Doe",
      "dob": "1990-02-03",
      "address": "1 Main St",
      "status": "Wanted",
      "photo_url": "",
      "last_seen": "",
      "physical": { "height": "5'7\"", "weight": "", "hair": "brown", "eyes": "" },
      "offenses": [{ "crime": "Robbery", "date": "2022-01-01", "severity": "High" }],
      "created_at": "2024-01-01T00:00:00Z",
      "updated_at": "2024-01-01T00:00:00Z"
    });
    let rec: Record = serde_json::from_value(json).unwrap();
    assert_eq!(rec.identifier, "A1");
    assert_eq!(rec.date_of_birth, "1990-02-03");
    assert_eq!(rec.most_recent_offense(), "Robbery");
    assert_eq!(rec.physical.hair.as_deref(), Some("brown"));
    assert!(rec.photo_url_or_placeholder().ends_with("text=JD"));
  }
}
