//! Error type for `casebook-store-sqlite`.
//!
//! Internal to the crate; at the [`casebook_core::store::CaseStore`]
//! boundary everything is converted into [`casebook_core::Error`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl From<Error> for casebook_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Json(e) => casebook_core::Error::Serialization(e),
      other => casebook_core::Error::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
