//! Error type for `tagcard-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain failure detected by the store (duplicate, already bound, …).
  #[error(transparent)]
  Core(#[from] tagcard_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),
}

/// Domain variants pass through untouched; everything else is an opaque
/// store failure.
impl From<Error> for tagcard_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => tagcard_core::Error::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
