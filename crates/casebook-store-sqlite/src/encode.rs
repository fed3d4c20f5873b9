//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings.

use casebook_core::{case::Case, update::CaseUpdate, user::User};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:      String,
  pub email:        String,
  pub display_name: String,
  pub created_at:   String,
  pub role:         Option<String>,
  pub last_login:   Option<String>,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      self.user_id,
      email:        self.email,
      display_name: self.display_name,
      created_at:   decode_dt(&self.created_at)?,
      role:         self.role,
      last_login:   self.last_login.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `cases` row.
pub struct RawCase {
  pub case_id:     String,
  pub user_id:     String,
  pub title:       String,
  pub description: String,
  pub priority:    String,
  pub status:      String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawCase {
  pub fn into_case(self) -> Result<Case> {
    Ok(Case {
      case_id:     decode_uuid(&self.case_id)?,
      user_id:     self.user_id,
      title:       self.title,
      description: self.description,
      priority:    self.priority,
      status:      self.status,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `case_updates` row.
pub struct RawUpdate {
  pub update_id:  String,
  pub case_id:    String,
  pub user_email: String,
  pub text:       String,
  pub new_status: Option<String>,
  pub timestamp:  String,
}

impl RawUpdate {
  pub fn into_update(self) -> Result<CaseUpdate> {
    Ok(CaseUpdate {
      update_id:  decode_uuid(&self.update_id)?,
      case_id:    decode_uuid(&self.case_id)?,
      user_email: self.user_email,
      text:       self.text,
      new_status: self.new_status,
      timestamp:  decode_dt(&self.timestamp)?,
    })
  }
}
