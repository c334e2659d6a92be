//! Error types for `rapsheet-core`.

use thiserror::Error;

/// A boxed backend error, carried as the source of fetch/insert failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("a record with identifier {0:?} already exists")]
  DuplicateIdentifier(String),

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error(
    "invalid identifier {0:?}: only letters, digits and hyphens are allowed"
  )]
  InvalidIdentifier(String),

  #[error("invalid offense date {0:?}: expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("unknown status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown severity: {0:?}")]
  UnknownSeverity(String),

  /// The backend read behind a refresh failed. The base list is unchanged.
  #[error("failed to fetch records: {0}")]
  Fetch(#[source] BoxError),

  /// The backend rejected or failed an insert. No local state was changed.
  #[error("failed to save record: {0}")]
  Insert(#[source] BoxError),

  #[error("failed to subscribe to changes: {0}")]
  Subscribe(#[source] BoxError),
}

impl Error {
  /// `true` for errors caused by the caller's input rather than the backend.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::MissingField(_)
        | Self::InvalidIdentifier(_)
        | Self::InvalidDate(_)
        | Self::UnknownStatus(_)
        | Self::UnknownSeverity(_)
    )
  }

  /// Find a core error anywhere in `err`'s source chain.
  ///
  /// Storage backends wrap core errors in their own types; the HTTP layer uses
  /// this to recover the original classification.
  pub fn find_in<'a>(
    err: &'a (dyn std::error::Error + 'static),
  ) -> Option<&'a Error> {
    let mut current = Some(err);
    while let Some(e) = current {
      if let Some(core) = e.downcast_ref::<Error>() {
        return Some(core);
      }
      current = e.source();
    }
    None
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
