//! HTTP layer for the Casebook tracking backend.
//!
//! Exposes an axum [`Router`] over any [`CaseStore`]: an authentication
//! gate in front of every handler, JSON case/update endpoints, and the
//! admin roster. Presentation (HTML rendering, static assets) is out of
//! scope; page routes return the data those pages render from.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod session;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router, middleware,
  routing::{get, patch, post},
};
use casebook_core::store::CaseStore;
use serde::{Deserialize, Serialize};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use auth::IdentityVerifier;
use session::SessionStore;

/// Upper bound on a single request, so a slow store or verifier call
/// cannot hold a connection indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Configuration ────────────────────────────────────────────────────────────

/// Identity-provider parameters. `secret` stays server-side; the rest is
/// safe to hand to the login page.
#[derive(Deserialize, Clone)]
pub struct IdentityConfig {
  pub issuer:      String,
  pub audience:    String,
  /// Shared secret the provider signs identity tokens with.
  pub secret:      String,
  /// Public API key the client uses to acquire identity tokens.
  pub web_api_key: String,
}

/// The subset of [`IdentityConfig`] exposed to browsers.
#[derive(Serialize, Clone)]
pub struct ClientIdentityConfig {
  pub issuer:      String,
  pub audience:    String,
  pub web_api_key: String,
}

impl IdentityConfig {
  pub fn client_view(&self) -> ClientIdentityConfig {
    ClientIdentityConfig {
      issuer:      self.issuer.clone(),
      audience:    self.audience.clone(),
      web_api_key: self.web_api_key.clone(),
    }
  }
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `CASEBOOK_*` environment variables. Missing required fields fail
/// startup, never lazily.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub identity:   IdentityConfig,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers; constructed once at
/// startup and injected per request.
#[derive(Clone)]
pub struct AppState<S: CaseStore> {
  pub store:    Arc<S>,
  pub sessions: Arc<SessionStore>,
  pub verifier: Arc<dyn IdentityVerifier>,
  pub config:   Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router. The authentication gate wraps
/// every route; request tracing and the request timeout sit outside it.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/",                           get(handlers::cases::dashboard::<S>))
    .route("/login",                      get(handlers::login::page::<S>))
    .route("/login-submit",               post(handlers::login::submit::<S>))
    .route("/create-case",                post(handlers::cases::create::<S>))
    .route("/get-cases",                  get(handlers::cases::list::<S>))
    .route("/update-case/{case_id}",      patch(handlers::cases::update::<S>))
    .route("/add-case-update",            post(handlers::updates::append::<S>))
    .route("/get-case-updates/{case_id}", get(handlers::updates::list::<S>))
    .route("/admin-panel",                get(handlers::admin::roster::<S>))
    .route("/admin/create-user",          post(handlers::admin::create_user::<S>))
    .layer(middleware::from_fn_with_state(state.clone(), auth::gate::<S>))
    .layer(TraceLayer::new_for_http())
    .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
