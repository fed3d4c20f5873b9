//! Server-side session store.
//!
//! Sessions are a time-bounded association between an opaque id (carried
//! in a cookie) and a verified user identity. The TTL is fixed at 12
//! hours, and every successful resolution slides the expiry forward by
//! the full TTL, so an active client never drops out mid-use.
//!
//! Time-dependent paths take an explicit `now` internally so TTL
//! boundaries can be unit tested without waiting.

use std::{
  collections::{HashMap, hash_map::Entry},
  sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Fixed session lifetime.
pub fn session_ttl() -> Duration { Duration::hours(12) }

/// A live association between a client and a verified identity.
#[derive(Debug, Clone)]
pub struct Session {
  pub user_id:    String,
  pub email:      String,
  pub expires_at: DateTime<Utc>,
}

/// In-process session map. Mutation only happens on login (create) and on
/// resolution (sliding refresh / expiry sweep); there is no revoke
/// operation in scope.
pub struct SessionStore {
  ttl:   Duration,
  inner: Mutex<HashMap<Uuid, Session>>,
}

impl Default for SessionStore {
  fn default() -> Self { Self::new() }
}

impl SessionStore {
  pub fn new() -> Self {
    Self {
      ttl:   session_ttl(),
      inner: Mutex::new(HashMap::new()),
    }
  }

  /// Establish a session for a verified identity and return its opaque
  /// id. Expired entries are swept opportunistically here.
  pub fn create(&self, user_id: &str, email: &str) -> Uuid {
    self.create_at(user_id, email, Utc::now())
  }

  /// Return the session for `id`, refreshing its expiry (sliding
  /// window). Expired or unknown ids yield `None`; expired entries are
  /// dropped on the spot.
  pub fn resolve(&self, id: Uuid) -> Option<Session> {
    self.resolve_at(id, Utc::now())
  }

  fn create_at(&self, user_id: &str, email: &str, now: DateTime<Utc>) -> Uuid {
    let mut map = self.lock();
    map.retain(|_, s| s.expires_at > now);

    let id = Uuid::new_v4();
    map.insert(id, Session {
      user_id:    user_id.to_owned(),
      email:      email.to_owned(),
      expires_at: now + self.ttl,
    });
    id
  }

  fn resolve_at(&self, id: Uuid, now: DateTime<Utc>) -> Option<Session> {
    let mut map = self.lock();
    match map.entry(id) {
      Entry::Occupied(mut entry) => {
        if entry.get().expires_at <= now {
          entry.remove();
          return None;
        }
        entry.get_mut().expires_at = now + self.ttl;
        Some(entry.get().clone())
      }
      Entry::Vacant(_) => None,
    }
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Session>> {
    // A poisoned lock only means another request panicked mid-insert;
    // the map itself is still usable.
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn create_then_resolve_returns_same_identity() {
    let store = SessionStore::new();
    let id = store.create("user-1", "user@example.com");

    let session = store.resolve(id).expect("fresh session");
    assert_eq!(session.user_id, "user-1");
    assert_eq!(session.email, "user@example.com");
  }

  #[test]
  fn unknown_id_resolves_to_none() {
    let store = SessionStore::new();
    assert!(store.resolve(Uuid::new_v4()).is_none());
  }

  #[test]
  fn session_is_valid_just_inside_the_ttl_window() {
    let store = SessionStore::new();
    let t0 = Utc::now();
    let id = store.create_at("user-1", "user@example.com", t0);

    let just_inside = t0 + Duration::hours(11) + Duration::minutes(59);
    assert!(store.resolve_at(id, just_inside).is_some());
  }

  #[test]
  fn session_is_invalid_just_past_the_ttl_window() {
    let store = SessionStore::new();
    let t0 = Utc::now();
    let id = store.create_at("user-1", "user@example.com", t0);

    let just_past = t0 + Duration::hours(12) + Duration::minutes(1);
    assert!(store.resolve_at(id, just_past).is_none());
    // The expired entry is gone for good, even for an earlier clock.
    assert!(store.resolve_at(id, t0).is_none());
  }

  #[test]
  fn resolution_slides_the_expiry_forward() {
    let store = SessionStore::new();
    let t0 = Utc::now();
    let id = store.create_at("user-1", "user@example.com", t0);

    // Touch the session at T+11h; it must then survive past the
    // original T+12h deadline.
    let touch = t0 + Duration::hours(11);
    store.resolve_at(id, touch).expect("still valid");

    let past_original_deadline = t0 + Duration::hours(13);
    let session = store
      .resolve_at(id, past_original_deadline)
      .expect("refreshed session");
    assert!(session.expires_at > past_original_deadline);
  }

  #[test]
  fn create_sweeps_expired_entries() {
    let store = SessionStore::new();
    let t0 = Utc::now();
    let stale = store.create_at("user-1", "a@example.com", t0);

    let later = t0 + Duration::hours(13);
    store.create_at("user-2", "b@example.com", later);

    assert!(store.resolve_at(stale, later).is_none());
  }
}
