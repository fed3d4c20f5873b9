//! Server error taxonomy and axum `IntoResponse` implementation.
//!
//! Every handler returns `Result<_, Error>`; this is the single boundary
//! at which errors become structured `{status: "error", message}` JSON
//! bodies. No error propagates to the client as an unhandled fault.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// No session, or the session has expired.
  #[error("not authenticated")]
  Unauthenticated,

  /// The identity token is malformed, expired, or failed validation.
  #[error("invalid identity token: {0}")]
  InvalidToken(String),

  #[error("{0}")]
  Validation(String),

  /// The caller is authenticated but does not own the case.
  #[error("not the owner of this case")]
  Forbidden,

  #[error("case not found: {0}")]
  CaseNotFound(Uuid),

  #[error("user already exists: {0}")]
  UserExists(String),

  #[error("index required: {0}")]
  IndexRequired(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<casebook_core::Error> for Error {
  fn from(err: casebook_core::Error) -> Self {
    match err {
      casebook_core::Error::CaseNotFound(id) => Error::CaseNotFound(id),
      casebook_core::Error::UserExists(id) => Error::UserExists(id),
      casebook_core::Error::IndexRequired(msg) => Error::IndexRequired(msg),
      casebook_core::Error::Validation(msg) => Error::Validation(msg),
      other => Error::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::Unauthenticated => StatusCode::UNAUTHORIZED,
      Error::Forbidden => StatusCode::FORBIDDEN,
      Error::CaseNotFound(_) => StatusCode::NOT_FOUND,
      Error::UserExists(_) => StatusCode::CONFLICT,
      Error::InvalidToken(_)
      | Error::Validation(_)
      | Error::IndexRequired(_)
      | Error::Store(_) => StatusCode::BAD_REQUEST,
    };

    (
      status,
      Json(json!({ "status": "error", "message": self.to_string() })),
    )
      .into_response()
  }
}
