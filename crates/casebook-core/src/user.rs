//! User — an authenticated identity known to the system.
//!
//! The primary key is issued by the external identity provider and is
//! immutable. Users are created on first successful login (or from the
//! admin panel) and never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user record as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  /// Provider-issued identifier; immutable.
  pub user_id:      String,
  pub email:        String,
  pub display_name: String,
  pub created_at:   DateTime<Utc>,
  /// Absent until assigned; roster views default this to "Unassigned".
  pub role:         Option<String>,
  pub last_login:   Option<DateTime<Utc>>,
}

/// Input to [`crate::store::CaseStore::ensure_user`] and
/// [`crate::store::CaseStore::create_user`]. Timestamps are set by the
/// store; they are not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub user_id:      String,
  pub email:        String,
  pub display_name: String,
}
