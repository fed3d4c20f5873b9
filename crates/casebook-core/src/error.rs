//! Error types for `casebook-core`.
//!
//! Handlers map these variants to distinct HTTP status codes, so the error
//! kind must survive the `CaseStore` trait boundary. Backend-specific
//! failures (I/O, SQL) are carried opaquely in [`Error::Store`].

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("case not found: {0}")]
  CaseNotFound(Uuid),

  #[error("user already exists: {0}")]
  UserExists(String),

  /// An ordered query cannot be satisfied by the current index
  /// configuration. The message names the missing index.
  #[error("index required: {0}")]
  IndexRequired(String),

  #[error("validation error: {0}")]
  Validation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
