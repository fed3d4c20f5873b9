//! Integration tests for `SqliteStore` against an in-memory database.

use std::time::Duration;

use casebook_core::{
  Error,
  case::{CasePatch, NewCase},
  store::CaseStore,
  update::NewCaseUpdate,
  user::NewUser,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(id: &str) -> NewUser {
  NewUser {
    user_id:      id.to_owned(),
    email:        format!("{id}@example.com"),
    display_name: format!("User {id}"),
  }
}

async fn seed_user(s: &SqliteStore, id: &str) {
  s.ensure_user(new_user(id)).await.unwrap();
}

fn titled(title: &str) -> NewCase {
  NewCase {
    title: Some(title.to_owned()),
    ..Default::default()
  }
}

fn update_for(case_id: Uuid, text: &str, new_status: Option<&str>) -> NewCaseUpdate {
  NewCaseUpdate {
    case_id,
    user_email: "author@example.com".to_owned(),
    text: text.to_owned(),
    new_status: new_status.map(str::to_owned),
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_user_creates_on_first_login() {
  let s = store().await;

  let user = s.ensure_user(new_user("alice")).await.unwrap();
  assert_eq!(user.user_id, "alice");
  assert_eq!(user.email, "alice@example.com");
  assert!(user.role.is_none());
  assert!(user.last_login.is_some());
}

#[tokio::test]
async fn ensure_user_preserves_profile_and_touches_last_login() {
  let s = store().await;

  let first = s.ensure_user(new_user("alice")).await.unwrap();

  tokio::time::sleep(Duration::from_millis(5)).await;

  // A later login carrying different profile fields must not overwrite
  // the stored ones.
  let changed = NewUser {
    user_id:      "alice".to_owned(),
    email:        "new-address@example.com".to_owned(),
    display_name: "Someone Else".to_owned(),
  };
  let second = s.ensure_user(changed).await.unwrap();

  assert_eq!(second.email, "alice@example.com");
  assert_eq!(second.display_name, "User alice");
  assert_eq!(second.created_at, first.created_at);
  assert!(second.last_login.unwrap() > first.last_login.unwrap());
}

#[tokio::test]
async fn create_user_rejects_duplicate_id() {
  let s = store().await;

  s.create_user(new_user("bob"), Some("Support".into()))
    .await
    .unwrap();
  let err = s.create_user(new_user("bob"), None).await.unwrap_err();
  assert!(matches!(err, Error::UserExists(id) if id == "bob"));
}

#[tokio::test]
async fn list_users_returns_roster() {
  let s = store().await;
  seed_user(&s, "alice").await;
  s.create_user(new_user("bob"), Some("Admin".into()))
    .await
    .unwrap();

  let users = s.list_users().await.unwrap();
  assert_eq!(users.len(), 2);

  let bob = users.iter().find(|u| u.user_id == "bob").unwrap();
  assert_eq!(bob.role.as_deref(), Some("Admin"));
  assert!(bob.last_login.is_none());
}

// ─── Cases ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_case_applies_defaults_and_equal_timestamps() {
  let s = store().await;
  seed_user(&s, "alice").await;

  let case = s.create_case("alice", NewCase::default()).await.unwrap();
  assert_eq!(case.title, "Untitled Case");
  assert_eq!(case.priority, "Unknown");
  assert_eq!(case.status, "Pending");
  assert_eq!(case.description, "");
  assert_eq!(case.created_at, case.updated_at);
}

#[tokio::test]
async fn create_then_list_round_trips() {
  let s = store().await;
  seed_user(&s, "alice").await;

  let created = s.create_case("alice", titled("A")).await.unwrap();

  let cases = s.list_cases("alice").await.unwrap();
  assert_eq!(cases.len(), 1);
  assert_eq!(cases[0].case_id, created.case_id);
  assert_eq!(cases[0].title, "A");
  assert_eq!(cases[0].created_at, cases[0].updated_at);
}

#[tokio::test]
async fn list_cases_never_leaks_other_owners() {
  let s = store().await;
  seed_user(&s, "alice").await;
  seed_user(&s, "bob").await;

  s.create_case("alice", titled("Mine")).await.unwrap();
  s.create_case("bob", titled("Theirs")).await.unwrap();
  s.create_case("bob", titled("Also theirs")).await.unwrap();

  let mine = s.list_cases("alice").await.unwrap();
  assert_eq!(mine.len(), 1);
  assert!(mine.iter().all(|c| c.user_id == "alice"));
}

#[tokio::test]
async fn get_case_missing_returns_none() {
  let s = store().await;
  assert!(s.get_case(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn update_case_persists_patch_and_bumps_updated_at() {
  let s = store().await;
  seed_user(&s, "alice").await;
  let case = s.create_case("alice", titled("Before")).await.unwrap();

  tokio::time::sleep(Duration::from_millis(5)).await;

  let patched = s
    .update_case(
      case.case_id,
      CasePatch {
        title: Some("After".into()),
        priority: Some("High".into()),
        ..Default::default()
      },
    )
    .await
    .unwrap();

  assert_eq!(patched.title, "After");
  assert_eq!(patched.priority, "High");
  // Untouched fields survive the merge.
  assert_eq!(patched.status, "Pending");
  assert!(patched.updated_at > case.updated_at);

  // The patch is durable, not an echo.
  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "After");
  assert_eq!(fetched.priority, "High");
}

#[tokio::test]
async fn update_case_missing_errors() {
  let s = store().await;
  let err = s
    .update_case(Uuid::new_v4(), CasePatch::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CaseNotFound(_)));
}

#[tokio::test]
async fn update_case_cannot_change_owner() {
  let s = store().await;
  seed_user(&s, "alice").await;
  let case = s.create_case("alice", titled("Fixed owner")).await.unwrap();

  let patched = s
    .update_case(case.case_id, CasePatch { status: Some("Open".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(patched.user_id, "alice");
}

// ─── Case updates ────────────────────────────────────────────────────────────

#[tokio::test]
async fn append_with_new_status_moves_the_case() {
  let s = store().await;
  seed_user(&s, "alice").await;
  let case = s.create_case("alice", titled("C")).await.unwrap();

  tokio::time::sleep(Duration::from_millis(5)).await;

  s.append_update(update_for(case.case_id, "closing this out", Some("Closed")))
    .await
    .unwrap();

  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, "Closed");
  assert!(fetched.updated_at > case.updated_at);
}

#[tokio::test]
async fn append_without_new_status_leaves_the_case() {
  let s = store().await;
  seed_user(&s, "alice").await;
  let case = s.create_case("alice", titled("C")).await.unwrap();

  s.append_update(update_for(case.case_id, "just a note", None))
    .await
    .unwrap();

  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, "Pending");
  assert_eq!(fetched.updated_at, case.updated_at);
}

#[tokio::test]
async fn empty_new_status_is_treated_as_absent() {
  let s = store().await;
  seed_user(&s, "alice").await;
  let case = s.create_case("alice", titled("C")).await.unwrap();

  let update = s
    .append_update(update_for(case.case_id, "note", Some("")))
    .await
    .unwrap();
  assert!(update.new_status.is_none());

  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, "Pending");
}

#[tokio::test]
async fn append_to_unknown_case_errors() {
  let s = store().await;
  let err = s
    .append_update(update_for(Uuid::new_v4(), "note", None))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CaseNotFound(_)));
}

#[tokio::test]
async fn list_updates_newest_first() {
  let s = store().await;
  seed_user(&s, "alice").await;
  let case = s.create_case("alice", titled("C")).await.unwrap();

  for text in ["first", "second", "third"] {
    s.append_update(update_for(case.case_id, text, None))
      .await
      .unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
  }

  let updates = s.list_updates(case.case_id).await.unwrap();
  assert_eq!(updates.len(), 3);
  assert_eq!(updates[0].text, "third");
  assert_eq!(updates[2].text, "first");
  assert!(updates.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}

#[tokio::test]
async fn list_updates_without_index_fails_loudly() {
  let s = store().await;
  seed_user(&s, "alice").await;
  let case = s.create_case("alice", titled("C")).await.unwrap();
  s.append_update(update_for(case.case_id, "note", None))
    .await
    .unwrap();

  s.execute_raw("DROP INDEX case_updates_case_ts_idx;")
    .await
    .unwrap();

  let err = s.list_updates(case.case_id).await.unwrap_err();
  assert!(
    matches!(&err, Error::IndexRequired(msg) if msg.contains("case_updates_case_ts_idx"))
  );
}

#[tokio::test]
async fn racing_appends_both_reach_the_audit_trail() {
  let s = store().await;
  seed_user(&s, "alice").await;
  let case = s.create_case("alice", titled("C")).await.unwrap();

  let (a, b) = tokio::join!(
    s.append_update(update_for(case.case_id, "close it", Some("Closed"))),
    s.append_update(update_for(case.case_id, "reopen it", Some("Reopened"))),
  );
  a.unwrap();
  b.unwrap();

  // Both audit rows persist even though only one status value survives.
  let updates = s.list_updates(case.case_id).await.unwrap();
  assert_eq!(updates.len(), 2);

  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert!(fetched.status == "Closed" || fetched.status == "Reopened");
}
