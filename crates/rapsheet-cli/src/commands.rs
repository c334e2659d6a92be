//! Non-interactive subcommands: `list`, `add`, `watch`.

use std::sync::Arc;

use anyhow::{Context, Result};
use rapsheet_core::{
  directory::Directory,
  record::{NewRecord, OffenseDraft, PhysicalDescription, Record, Severity, Status},
  sync::Synchronizer,
};
use tracing::info;

use crate::client::ApiClient;

// ─── Argument parsers ─────────────────────────────────────────────────────────

/// Parse a status in display form (`"On Parole"`), for clap.
pub fn parse_status(s: &str) -> Result<Status, String> {
  Status::parse(s.trim()).map_err(|e| e.to_string())
}

/// Parse `crime|YYYY-MM-DD[|Severity]` into a draft. Severity defaults to
/// `Low`; date validity is checked later, when offenses are composed.
pub fn parse_offense(s: &str) -> Result<OffenseDraft, String> {
  let mut parts = s.split('|').map(str::trim);
  let crime = parts.next().unwrap_or_default();
  let date = parts
    .next()
    .ok_or_else(|| format!("offense {s:?}: expected crime|YYYY-MM-DD[|severity]"))?;
  let severity = match parts.next() {
    None | Some("") => Severity::default(),
    Some(raw) => Severity::parse(raw).map_err(|e| e.to_string())?,
  };
  if parts.next().is_some() {
    return Err(format!("offense {s:?}: too many fields"));
  }
  Ok(OffenseDraft::new(crime, date, severity))
}

// ─── list ─────────────────────────────────────────────────────────────────────

pub async fn list(
  client: ApiClient,
  search: Option<String>,
  status: Option<Status>,
) -> Result<()> {
  let sync = Synchronizer::new(Arc::new(client));
  sync.refresh().await.context("loading records")?;

  let mut directory = Directory::from_snapshot(&sync.snapshot());
  directory.set_search(search.unwrap_or_default());
  directory.set_status(status);

  if let Some(hint) = directory.empty_hint() {
    println!("{hint}");
    return Ok(());
  }
  for record in directory.displayed() {
    println!("{}", summary_line(record));
  }
  Ok(())
}

fn summary_line(record: &Record) -> String {
  format!(
    "{:<10} {:<24} {:<13} {}",
    record.identifier,
    record.full_name(),
    record.status.as_ref(),
    record.most_recent_offense()
  )
}

// ─── add ──────────────────────────────────────────────────────────────────────

/// Everything `add` accepts besides the connection settings.
#[derive(Debug, Clone)]
pub struct AddArgs {
  pub id:            String,
  pub first_name:    String,
  pub last_name:     String,
  pub status:        Status,
  pub date_of_birth: Option<String>,
  pub address:       Option<String>,
  pub last_seen:     Option<String>,
  pub photo_url:     Option<String>,
  pub physical:      PhysicalDescription,
  pub offenses:      Vec<OffenseDraft>,
}

impl AddArgs {
  pub fn into_new_record(self) -> rapsheet_core::Result<NewRecord> {
    let mut input = NewRecord::new(self.id, self.first_name, self.last_name, self.status)
      .with_offense_drafts(self.offenses)?;
    input.date_of_birth = self.date_of_birth.unwrap_or_default();
    input.address = self.address.unwrap_or_default();
    input.last_seen = self.last_seen.unwrap_or_default();
    input.photo_url = self.photo_url.unwrap_or_default();
    input.physical = self.physical;
    Ok(input)
  }
}

pub async fn add(client: ApiClient, args: AddArgs) -> Result<()> {
  let input = args.into_new_record()?;
  let sync = Synchronizer::new(Arc::new(client));
  let record = sync.insert(input).await?;

  println!("saved {}", summary_line(&record));
  for offense in &record.offenses {
    println!("  {}  {:<9} {}", offense.date, offense.severity.as_ref(), offense.crime);
  }
  Ok(())
}

// ─── watch ────────────────────────────────────────────────────────────────────

/// Print one line per applied refresh until Ctrl-C.
pub async fn watch(client: ApiClient) -> Result<()> {
  let sync = Arc::new(Synchronizer::new(Arc::new(client)));
  sync.refresh().await.context("loading records")?;
  println!("{} records", sync.snapshot().records.len());

  let sub = sync
    .subscribe(|snapshot| {
      println!(
        "refresh #{}: {} records",
        snapshot.generation,
        snapshot.records.len()
      );
    })
    .await
    .context("subscribing to changes")?;

  tokio::select! {
    res = tokio::signal::ctrl_c() => res.context("waiting for Ctrl-C")?,
    _ = wait_finished(&sub) => println!("change stream closed"),
  }
  info!("stopping watch");
  sync.unsubscribe(sub).await;
  Ok(())
}

async fn wait_finished(sub: &rapsheet_core::sync::Subscription) {
  while !sub.is_finished() {
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn offense_with_all_fields() {
    let draft = parse_offense("Robbery | 2023-05-05 | High").unwrap();
    assert_eq!(draft, OffenseDraft::new("Robbery", "2023-05-05", Severity::High));
  }

  #[test]
  fn offense_severity_defaults_to_low() {
    let draft = parse_offense("Theft|2021-01-01").unwrap();
    assert_eq!(draft.severity, Severity::Low);
  }

  #[test]
  fn offense_needs_a_date_field() {
    assert!(parse_offense("Theft").is_err());
    assert!(parse_offense("Theft|2021-01-01|Low|extra").is_err());
    assert!(parse_offense("Theft|2021-01-01|Catastrophic").is_err());
  }

  #[test]
  fn status_accepts_display_form() {
    assert_eq!(parse_status("On Parole").unwrap(), Status::OnParole);
    assert!(parse_status("parole").is_err());
  }

  #[test]
  fn add_args_drop_incomplete_offenses() {
    let args = AddArgs {
      id:            "A1".into(),
      first_name:    "Jane".into(),
      last_name:     "Doe".into(),
      status:        Status::Wanted,
      date_of_birth: Some("1990-01-01".into()),
      address:       None,
      last_seen:     None,
      photo_url:     None,
      physical:      PhysicalDescription::default(),
      offenses:      vec![
        parse_offense("Theft|2021-01-01").unwrap(),
        parse_offense(" |2022-01-01").unwrap(),
        parse_offense("Fraud|2023-03-03|Medium").unwrap(),
      ],
    };
    let input = args.into_new_record().unwrap();
    let crimes: Vec<_> = input.offenses.iter().map(|o| o.crime.as_str()).collect();
    assert_eq!(crimes, ["Fraud", "Theft"]);
    assert_eq!(input.date_of_birth, "1990-01-01");
  }
}
