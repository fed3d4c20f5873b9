//! [`SqliteStore`] — the SQLite implementation of [`CaseStore`].

use std::{future::Future, path::Path, time::Duration};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use casebook_core::{
  case::{Case, CasePatch, DEFAULT_PRIORITY, DEFAULT_STATUS, DEFAULT_TITLE, NewCase},
  store::CaseStore,
  update::{CaseUpdate, NewCaseUpdate},
  user::{NewUser, User},
};

use crate::{
  Error, Result,
  encode::{RawCase, RawUpdate, RawUser, encode_dt, encode_uuid},
  schema::{SCHEMA, UPDATES_INDEX},
};

/// Retries attempted for transient busy/locked errors before giving up.
const BUSY_RETRIES: u32 = 3;
/// Initial backoff delay; doubles on each retry.
const BUSY_BACKOFF: Duration = Duration::from_millis(50);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Casebook store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `op` on the connection, retrying transient busy/locked failures
  /// with doubling backoff. Non-transient errors surface immediately.
  async fn call_retrying<T, F>(&self, op: F) -> Result<T>
  where
    F: Fn(&mut rusqlite::Connection) -> tokio_rusqlite::Result<T>
      + Clone
      + Send
      + 'static,
    T: Send + 'static,
  {
    let mut delay = BUSY_BACKOFF;
    let mut attempt = 0u32;
    loop {
      match self.conn.call(op.clone()).await {
        Err(e) if attempt < BUSY_RETRIES && is_transient(&e) => {
          attempt += 1;
          tracing::warn!(error = %e, attempt, "database busy, retrying");
          tokio::time::sleep(delay).await;
          delay *= 2;
        }
        other => return Ok(other?),
      }
    }
  }

  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn is_transient(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    err,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
      if e.code == rusqlite::ErrorCode::DatabaseBusy
        || e.code == rusqlite::ErrorCode::DatabaseLocked
  )
}

fn is_constraint(err: &Error) -> bool {
  matches!(
    err,
    Error::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(e, _),
    )) if e.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

// ─── Row mappers ─────────────────────────────────────────────────────────────

const USER_COLUMNS: &str =
  "user_id, email, display_name, created_at, role, last_login";

fn user_row(row: &rusqlite::Row) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:      row.get(0)?,
    email:        row.get(1)?,
    display_name: row.get(2)?,
    created_at:   row.get(3)?,
    role:         row.get(4)?,
    last_login:   row.get(5)?,
  })
}

const CASE_COLUMNS: &str =
  "case_id, user_id, title, description, priority, status, created_at, \
   updated_at";

fn case_row(row: &rusqlite::Row) -> rusqlite::Result<RawCase> {
  Ok(RawCase {
    case_id:     row.get(0)?,
    user_id:     row.get(1)?,
    title:       row.get(2)?,
    description: row.get(3)?,
    priority:    row.get(4)?,
    status:      row.get(5)?,
    created_at:  row.get(6)?,
    updated_at:  row.get(7)?,
  })
}

fn update_row(row: &rusqlite::Row) -> rusqlite::Result<RawUpdate> {
  Ok(RawUpdate {
    update_id:  row.get(0)?,
    case_id:    row.get(1)?,
    user_email: row.get(2)?,
    text:       row.get(3)?,
    new_status: row.get(4)?,
    timestamp:  row.get(5)?,
  })
}

// ─── CaseStore impl ──────────────────────────────────────────────────────────

impl CaseStore for SqliteStore {
  // ── Users ─────────────────────────────────────────────────────────────────

  async fn ensure_user(&self, input: NewUser) -> casebook_core::Result<User> {
    let now_str = encode_dt(Utc::now());

    let raw: RawUser = self
      .call_retrying(move |conn| {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
        let existing = conn
          .query_row(&sql, rusqlite::params![input.user_id], user_row)
          .optional()?;

        if let Some(mut row) = existing {
          // Existing profile fields are never overwritten on login.
          conn.execute(
            "UPDATE users SET last_login = ?2 WHERE user_id = ?1",
            rusqlite::params![input.user_id, now_str],
          )?;
          row.last_login = Some(now_str.clone());
          return Ok(row);
        }

        conn.execute(
          "INSERT INTO users (user_id, email, display_name, created_at, role, last_login)
           VALUES (?1, ?2, ?3, ?4, NULL, ?5)",
          rusqlite::params![
            input.user_id,
            input.email,
            input.display_name,
            now_str,
            now_str,
          ],
        )?;

        Ok(RawUser {
          user_id:      input.user_id.clone(),
          email:        input.email.clone(),
          display_name: input.display_name.clone(),
          created_at:   now_str.clone(),
          role:         None,
          last_login:   Some(now_str.clone()),
        })
      })
      .await?;

    Ok(raw.into_user()?)
  }

  async fn create_user(
    &self,
    input: NewUser,
    role: Option<String>,
  ) -> casebook_core::Result<User> {
    let user = User {
      user_id:      input.user_id,
      email:        input.email,
      display_name: input.display_name,
      created_at:   Utc::now(),
      role,
      last_login:   None,
    };

    let user_id_str = user.user_id.clone();
    let email       = user.email.clone();
    let name        = user.display_name.clone();
    let at_str      = encode_dt(user.created_at);
    let role_str    = user.role.clone();

    let result = self
      .call_retrying(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, email, display_name, created_at, role, last_login)
           VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
          rusqlite::params![user_id_str, email, name, at_str, role_str],
        )?;
        Ok(())
      })
      .await;

    match result {
      Ok(()) => Ok(user),
      Err(e) if is_constraint(&e) => {
        Err(casebook_core::Error::UserExists(user.user_id))
      }
      Err(e) => Err(e.into()),
    }
  }

  fn get_user(
    &self,
    user_id: &str,
  ) -> impl Future<Output = casebook_core::Result<Option<User>>> + Send + '_ {
    let id = user_id.to_owned();

    async move {
      let raw: Option<RawUser> = self
        .call_retrying(move |conn| {
          let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
          Ok(conn.query_row(&sql, rusqlite::params![id], user_row).optional()?)
        })
        .await?;

      Ok(raw.map(RawUser::into_user).transpose()?)
    }
  }

  async fn list_users(&self) -> casebook_core::Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .call_retrying(move |conn| {
        let sql = format!("SELECT {USER_COLUMNS} FROM users");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], user_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      raws
        .into_iter()
        .map(RawUser::into_user)
        .collect::<Result<_>>()?,
    )
  }

  // ── Cases ─────────────────────────────────────────────────────────────────

  fn create_case(
    &self,
    owner_id: &str,
    input: NewCase,
  ) -> impl Future<Output = casebook_core::Result<Case>> + Send + '_ {
    let owner_id = owner_id.to_owned();

    async move {
      let now = Utc::now();
      let case = Case {
        case_id:     Uuid::new_v4(),
        user_id:     owner_id,
        title:       input.title.unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
        description: input.description.unwrap_or_default(),
        priority:    input
          .priority
          .unwrap_or_else(|| DEFAULT_PRIORITY.to_owned()),
        status:      input.status.unwrap_or_else(|| DEFAULT_STATUS.to_owned()),
        created_at:  now,
        updated_at:  now,
      };

      let id_str      = encode_uuid(case.case_id);
      let owner       = case.user_id.clone();
      let title       = case.title.clone();
      let description = case.description.clone();
      let priority    = case.priority.clone();
      let status      = case.status.clone();
      let at_str      = encode_dt(now);

      self
        .call_retrying(move |conn| {
          conn.execute(
            "INSERT INTO cases (
               case_id, user_id, title, description, priority, status,
               created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            rusqlite::params![
              id_str,
              owner,
              title,
              description,
              priority,
              status,
              at_str,
            ],
          )?;
          Ok(())
        })
        .await?;

      Ok(case)
    }
  }

  fn list_cases(
    &self,
    owner_id: &str,
  ) -> impl Future<Output = casebook_core::Result<Vec<Case>>> + Send + '_ {
    let owner = owner_id.to_owned();

    async move {
      let raws: Vec<RawCase> = self
        .call_retrying(move |conn| {
          let sql =
            format!("SELECT {CASE_COLUMNS} FROM cases WHERE user_id = ?1");
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt
            .query_map(rusqlite::params![owner], case_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?;

      Ok(
        raws
          .into_iter()
          .map(RawCase::into_case)
          .collect::<Result<_>>()?,
      )
    }
  }

  async fn get_case(&self, case_id: Uuid) -> casebook_core::Result<Option<Case>> {
    let id_str = encode_uuid(case_id);

    let raw: Option<RawCase> = self
      .call_retrying(move |conn| {
        let sql = format!("SELECT {CASE_COLUMNS} FROM cases WHERE case_id = ?1");
        Ok(conn.query_row(&sql, rusqlite::params![id_str], case_row).optional()?)
      })
      .await?;

    Ok(raw.map(RawCase::into_case).transpose()?)
  }

  async fn update_case(
    &self,
    case_id: Uuid,
    patch: CasePatch,
  ) -> casebook_core::Result<Case> {
    let id_str  = encode_uuid(case_id);
    let now_str = encode_dt(Utc::now());

    let raw: Option<RawCase> = self
      .call_retrying(move |conn| {
        let sql = format!("SELECT {CASE_COLUMNS} FROM cases WHERE case_id = ?1");
        let existing = conn
          .query_row(&sql, rusqlite::params![id_str], case_row)
          .optional()?;

        let Some(mut row) = existing else {
          return Ok(None);
        };

        // Merge the patch; the owner column is deliberately untouched.
        if let Some(title) = &patch.title {
          row.title = title.clone();
        }
        if let Some(description) = &patch.description {
          row.description = description.clone();
        }
        if let Some(priority) = &patch.priority {
          row.priority = priority.clone();
        }
        if let Some(status) = &patch.status {
          row.status = status.clone();
        }
        row.updated_at = now_str.clone();

        conn.execute(
          "UPDATE cases
           SET title = ?2, description = ?3, priority = ?4, status = ?5,
               updated_at = ?6
           WHERE case_id = ?1",
          rusqlite::params![
            id_str,
            row.title,
            row.description,
            row.priority,
            row.status,
            row.updated_at,
          ],
        )?;

        Ok(Some(row))
      })
      .await?;

    let raw = raw.ok_or(casebook_core::Error::CaseNotFound(case_id))?;
    Ok(raw.into_case()?)
  }

  // ── Case updates — append-only ────────────────────────────────────────────

  async fn append_update(
    &self,
    input: NewCaseUpdate,
  ) -> casebook_core::Result<CaseUpdate> {
    let input = input.normalized();
    let update = CaseUpdate {
      update_id:  Uuid::new_v4(),
      case_id:    input.case_id,
      user_email: input.user_email,
      text:       input.text,
      new_status: input.new_status,
      timestamp:  Utc::now(),
    };

    let update_id_str = encode_uuid(update.update_id);
    let case_id_str   = encode_uuid(update.case_id);
    let user_email    = update.user_email.clone();
    let text          = update.text.clone();
    let new_status    = update.new_status.clone();
    let at_str        = encode_dt(update.timestamp);

    // The audit row is written first and never rolled back; the status
    // mutation follows in the same connection call without a wrapping
    // transaction.
    let result = self
      .call_retrying(move |conn| {
        conn.execute(
          "INSERT INTO case_updates (
             update_id, case_id, user_email, text, new_status, timestamp
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            update_id_str,
            case_id_str,
            user_email,
            text,
            new_status,
            at_str,
          ],
        )?;

        if let Some(status) = &new_status {
          conn.execute(
            "UPDATE cases SET status = ?2, updated_at = ?3 WHERE case_id = ?1",
            rusqlite::params![case_id_str, status, at_str],
          )?;
        }

        Ok(())
      })
      .await;

    match result {
      Ok(()) => Ok(update),
      // The foreign key on case_updates.case_id rejects unknown cases.
      Err(e) if is_constraint(&e) => {
        Err(casebook_core::Error::CaseNotFound(update.case_id))
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn list_updates(
    &self,
    case_id: Uuid,
  ) -> casebook_core::Result<Vec<CaseUpdate>> {
    let id_str = encode_uuid(case_id);

    let raws: Option<Vec<RawUpdate>> = self
      .call_retrying(move |conn| {
        // Refuse to run the ordered query without its index: an unsorted
        // or partial history is worse than a provisioning error.
        let indexed: bool = conn
          .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1",
            rusqlite::params![UPDATES_INDEX],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !indexed {
          return Ok(None);
        }

        let mut stmt = conn.prepare(
          "SELECT update_id, case_id, user_email, text, new_status, timestamp
           FROM case_updates
           WHERE case_id = ?1
           ORDER BY timestamp DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], update_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(rows))
      })
      .await?;

    let raws = raws.ok_or_else(|| {
      casebook_core::Error::IndexRequired(format!(
        "create index {UPDATES_INDEX} on case_updates(case_id, timestamp) \
         to serve the case history query"
      ))
    })?;

    Ok(
      raws
        .into_iter()
        .map(RawUpdate::into_update)
        .collect::<Result<_>>()?,
    )
  }
}
