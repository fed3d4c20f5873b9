//! Identity verification and the request authentication gate.
//!
//! Two layers live here:
//!
//! - [`IdentityVerifier`] / [`TokenVerifier`]: validates the opaque
//!   identity token presented at login against the configured provider
//!   parameters (HS256 shared secret, issuer, audience).
//! - [`gate`]: axum middleware that runs before every handler, resolving
//!   the session cookie for protected paths and injecting
//!   [`CurrentUser`] into request extensions.

use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, header, request::Parts},
  middleware::Next,
  response::{IntoResponse, Redirect, Response},
};
use casebook_core::store::CaseStore;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, IdentityConfig, error::Error};

// ─── Identity verification ───────────────────────────────────────────────────

/// The stable identity extracted from a valid token.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
  pub user_id:      String,
  pub email:        String,
  pub display_name: Option<String>,
}

/// Validates an opaque bearer token and yields the identity it proves.
pub trait IdentityVerifier: Send + Sync {
  fn verify(&self, token: &str) -> Result<VerifiedIdentity, Error>;
}

/// Claims carried by the provider-issued identity token. Issuer,
/// audience, and expiry are validated from the raw token by
/// `jsonwebtoken`; only the fields we consume are deserialised here.
#[derive(Debug, Deserialize)]
struct Claims {
  sub:   String,
  email: String,
  #[serde(default)]
  name:  Option<String>,
}

/// Production verifier: the token is a JWT signed with the provider's
/// shared secret.
pub struct TokenVerifier {
  decoding:   DecodingKey,
  validation: Validation,
}

impl TokenVerifier {
  pub fn new(config: &IdentityConfig) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[config.issuer.clone()]);
    validation.set_audience(&[config.audience.clone()]);

    Self {
      decoding: DecodingKey::from_secret(config.secret.as_bytes()),
      validation,
    }
  }
}

impl IdentityVerifier for TokenVerifier {
  fn verify(&self, token: &str) -> Result<VerifiedIdentity, Error> {
    let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
      .map_err(|e| Error::InvalidToken(e.to_string()))?;

    Ok(VerifiedIdentity {
      user_id:      data.claims.sub,
      email:        data.claims.email,
      display_name: data.claims.name,
    })
  }
}

// ─── Session cookie ──────────────────────────────────────────────────────────

pub const SESSION_COOKIE: &str = "sid";

/// `Set-Cookie` value for a freshly created session.
pub fn session_cookie(id: Uuid) -> String {
  format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
  let raw = headers.get(header::COOKIE)?.to_str().ok()?;
  raw.split(';').find_map(|pair| {
    let (name, value) = pair.trim().split_once('=')?;
    (name == SESSION_COOKIE)
      .then(|| Uuid::parse_str(value.trim()).ok())
      .flatten()
  })
}

/// Resolve (and slide-refresh) the session named by the request's cookie.
pub fn resolve_session<S>(
  state: &AppState<S>,
  headers: &HeaderMap,
) -> Option<CurrentUser>
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  let id = session_id_from_headers(headers)?;
  let session = state.sessions.resolve(id)?;
  Some(CurrentUser {
    user_id: session.user_id,
    email:   session.email,
  })
}

// ─── Authentication gate ─────────────────────────────────────────────────────

/// Public paths that bypass the gate: the login page, the login
/// submission endpoint, and static assets.
pub fn is_public(path: &str) -> bool {
  matches!(path, "/login" | "/login-submit") || path.starts_with("/static/")
}

fn prefers_html(headers: &HeaderMap) -> bool {
  headers
    .get(header::ACCEPT)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|accept| accept.contains("text/html"))
}

/// Middleware applied to the whole router; runs before any handler body.
/// Protected requests without a live session are redirected to the login
/// page when they look like browser navigations, and rejected with a
/// 401 JSON body otherwise.
pub async fn gate<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Response
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  if is_public(req.uri().path()) {
    return next.run(req).await;
  }

  match resolve_session(&state, req.headers()) {
    Some(user) => {
      req.extensions_mut().insert(user);
      next.run(req).await
    }
    None if prefers_html(req.headers()) => {
      Redirect::to("/login").into_response()
    }
    None => Error::Unauthenticated.into_response(),
  }
}

// ─── CurrentUser extractor ───────────────────────────────────────────────────

/// The verified identity behind the current request, injected by the
/// gate. Present in a handler's signature means the request passed
/// authentication.
#[derive(Debug, Clone)]
pub struct CurrentUser {
  pub user_id: String,
  pub email:   String,
}

impl<St> FromRequestParts<St> for CurrentUser
where
  St: Send + Sync,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<CurrentUser>()
      .cloned()
      .ok_or(Error::Unauthenticated)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use jsonwebtoken::{EncodingKey, Header};

  const SECRET: &str = "test-secret";

  fn config() -> IdentityConfig {
    IdentityConfig {
      issuer:      "https://issuer.test".to_owned(),
      audience:    "casebook-test".to_owned(),
      secret:      SECRET.to_owned(),
      web_api_key: "public-web-key".to_owned(),
    }
  }

  fn mint(claims: serde_json::Value) -> String {
    jsonwebtoken::encode(
      &Header::default(),
      &claims,
      &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
  }

  fn valid_claims() -> serde_json::Value {
    serde_json::json!({
      "sub": "user-1",
      "email": "user@example.com",
      "name": "Test User",
      "iss": "https://issuer.test",
      "aud": "casebook-test",
      "exp": (Utc::now() + chrono::Duration::hours(1)).timestamp(),
    })
  }

  #[test]
  fn valid_token_yields_identity() {
    let verifier = TokenVerifier::new(&config());
    let identity = verifier.verify(&mint(valid_claims())).unwrap();

    assert_eq!(identity.user_id, "user-1");
    assert_eq!(identity.email, "user@example.com");
    assert_eq!(identity.display_name.as_deref(), Some("Test User"));
  }

  #[test]
  fn garbage_token_is_rejected() {
    let verifier = TokenVerifier::new(&config());
    let err = verifier.verify("not-a-token").unwrap_err();
    assert!(matches!(err, Error::InvalidToken(_)));
  }

  #[test]
  fn expired_token_is_rejected() {
    let mut claims = valid_claims();
    claims["exp"] =
      serde_json::json!((Utc::now() - chrono::Duration::hours(1)).timestamp());

    let verifier = TokenVerifier::new(&config());
    let err = verifier.verify(&mint(claims)).unwrap_err();
    assert!(matches!(err, Error::InvalidToken(_)));
  }

  #[test]
  fn wrong_audience_is_rejected() {
    let mut claims = valid_claims();
    claims["aud"] = serde_json::json!("someone-else");

    let verifier = TokenVerifier::new(&config());
    let err = verifier.verify(&mint(claims)).unwrap_err();
    assert!(matches!(err, Error::InvalidToken(_)));
  }

  #[test]
  fn cookie_header_parsing_finds_the_session_id() {
    let id = Uuid::new_v4();
    let mut headers = HeaderMap::new();
    headers.insert(
      header::COOKIE,
      format!("theme=dark; sid={id}; lang=en").parse().unwrap(),
    );
    assert_eq!(session_id_from_headers(&headers), Some(id));
  }

  #[test]
  fn missing_or_mangled_cookie_yields_none() {
    let mut headers = HeaderMap::new();
    assert!(session_id_from_headers(&headers).is_none());

    headers.insert(header::COOKIE, "sid=not-a-uuid".parse().unwrap());
    assert!(session_id_from_headers(&headers).is_none());
  }
}
