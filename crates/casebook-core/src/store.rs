//! The `CaseStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `casebook-store-sqlite`). The HTTP layer depends on this abstraction,
//! not on any concrete backend.
//!
//! All methods return [`crate::Result`] so that handlers can map the
//! taxonomy in [`crate::error`] to distinct HTTP responses regardless of
//! the backend in use.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Result,
  case::{Case, CasePatch, NewCase},
  update::{CaseUpdate, NewCaseUpdate},
  user::{NewUser, User},
};

/// Abstraction over a Casebook storage backend.
///
/// Case updates are append-only; a case's `status` and `updated_at` are the
/// only fields mutated on its behalf. All methods return `Send` futures so
/// the trait can be used in multi-threaded async runtimes (tokio + axum).
pub trait CaseStore: Send + Sync {
  // ── Users ─────────────────────────────────────────────────────────────

  /// Login-path upsert keyed by `user_id`: insert the user if absent,
  /// otherwise touch `last_login` only. Profile fields of an existing
  /// user are never overwritten.
  fn ensure_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User>> + Send + '_;

  /// Admin-path creation. Fails with [`crate::Error::UserExists`] when the
  /// id is already taken.
  fn create_user(
    &self,
    input: NewUser,
    role: Option<String>,
  ) -> impl Future<Output = Result<User>> + Send + '_;

  /// Retrieve a user by provider id. Returns `None` if not found.
  fn get_user(
    &self,
    user_id: &str,
  ) -> impl Future<Output = Result<Option<User>>> + Send + '_;

  /// List all known users — the admin roster. No pagination; acceptable
  /// for low cardinality.
  fn list_users(&self) -> impl Future<Output = Result<Vec<User>>> + Send + '_;

  // ── Cases ─────────────────────────────────────────────────────────────

  /// Create a case owned by `owner_id`. Assigns a fresh id, applies field
  /// defaults, and stamps `created_at == updated_at` with the current
  /// time.
  fn create_case(
    &self,
    owner_id: &str,
    input: NewCase,
  ) -> impl Future<Output = Result<Case>> + Send + '_;

  /// All cases where `user_id == owner_id`, in insertion order.
  fn list_cases(
    &self,
    owner_id: &str,
  ) -> impl Future<Output = Result<Vec<Case>>> + Send + '_;

  /// Retrieve a single case. Returns `None` if not found.
  fn get_case(
    &self,
    case_id: Uuid,
  ) -> impl Future<Output = Result<Option<Case>>> + Send + '_;

  /// Merge `patch` onto the stored record and bump `updated_at`. The
  /// owner is immutable and cannot be patched. Fails with
  /// [`crate::Error::CaseNotFound`] for an unknown id.
  fn update_case(
    &self,
    case_id: Uuid,
    patch: CasePatch,
  ) -> impl Future<Output = Result<Case>> + Send + '_;

  // ── Case updates — append-only ────────────────────────────────────────

  /// Persist a new immutable update, stamping its timestamp. When the
  /// input carries a non-empty `new_status`, the referenced case's
  /// `status` and `updated_at` are mutated after the update row is
  /// written, so a crash between the two writes still leaves an audit
  /// trail.
  fn append_update(
    &self,
    input: NewCaseUpdate,
  ) -> impl Future<Output = Result<CaseUpdate>> + Send + '_;

  /// All updates for a case, ordered by timestamp descending. Backends
  /// must fail with [`crate::Error::IndexRequired`] when the ordered
  /// query cannot be served by an index, rather than returning unsorted
  /// or partial results.
  fn list_updates(
    &self,
    case_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CaseUpdate>>> + Send + '_;
}
