//! Case — a tracked unit of work owned by a user.
//!
//! The owner is fixed at creation; `status` and `updated_at` mutate via
//! case updates (see [`crate::update`]) or explicit patches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Field defaults applied at the repository boundary when the caller
/// omits a value.
pub const DEFAULT_TITLE: &str = "Untitled Case";
pub const DEFAULT_PRIORITY: &str = "Unknown";
pub const DEFAULT_STATUS: &str = "Pending";

/// A case record as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
  pub case_id:     Uuid,
  /// Owner; immutable after creation.
  pub user_id:     String,
  pub title:       String,
  pub description: String,
  pub priority:    String,
  pub status:      String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::store::CaseStore::create_case`]. Missing fields take
/// the defaults above; id and timestamps are assigned by the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCase {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub priority:    Option<String>,
  pub status:      Option<String>,
}

/// A partial update for [`crate::store::CaseStore::update_case`]. Only the
/// fields present are written; `updated_at` is bumped by the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CasePatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub priority:    Option<String>,
  pub status:      Option<String>,
}

impl CasePatch {
  /// True when the patch carries no fields at all.
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.description.is_none()
      && self.priority.is_none()
      && self.status.is_none()
  }
}
