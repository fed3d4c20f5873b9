//! Case updates — the append-only audit trail attached to a case.
//!
//! An update is immutable once persisted. The ordered sequence of a case's
//! updates, newest first, is the case's history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable, timestamped note appended to a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseUpdate {
  pub update_id:  Uuid,
  pub case_id:    Uuid,
  /// Email of the author, captured from the session at append time.
  pub user_email: String,
  pub text:       String,
  /// When present, the referenced case's status was moved to this value.
  pub new_status: Option<String>,
  /// Server-assigned; never changes after creation.
  pub timestamp:  DateTime<Utc>,
}

/// Input to [`crate::store::CaseStore::append_update`]. The timestamp is
/// always set by the store.
#[derive(Debug, Clone)]
pub struct NewCaseUpdate {
  pub case_id:    Uuid,
  pub user_email: String,
  pub text:       String,
  pub new_status: Option<String>,
}

impl NewCaseUpdate {
  /// Normalise caller input: an empty-string `new_status` means "no status
  /// change", matching the web client's form behaviour.
  pub fn normalized(mut self) -> Self {
    if self.new_status.as_deref().is_some_and(|s| s.trim().is_empty()) {
      self.new_status = None;
    }
    self
  }
}
