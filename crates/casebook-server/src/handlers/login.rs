//! Login endpoints — the only public routes besides static assets.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/login` | 303 to `/` when already authenticated |
//! | `POST` | `/login-submit` | Body: `{"idToken": "..."}` |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, HeaderValue, header},
  response::{IntoResponse, Redirect, Response},
};
use casebook_core::{store::CaseStore, user::NewUser};
use serde::Deserialize;
use serde_json::json;

use crate::{
  AppState,
  auth::{resolve_session, session_cookie},
  error::Error,
};

/// `GET /login` — the data the login page is rendered from: the public
/// identity-provider parameters and the client-side API key. The signing
/// secret never leaves the server.
pub async fn page<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Response
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  if resolve_session(&state, &headers).is_some() {
    return Redirect::to("/").into_response();
  }

  Json(json!({
    "status": "success",
    "identity": state.config.identity.client_view(),
  }))
  .into_response()
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  #[serde(rename = "idToken")]
  pub id_token: String,
}

/// `POST /login-submit` — verify the identity token, upsert the user,
/// and establish a session.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Response, Error>
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  let identity = state.verifier.verify(&body.id_token)?;

  let user = state
    .store
    .ensure_user(NewUser {
      user_id:      identity.user_id,
      email:        identity.email,
      display_name: identity.display_name.unwrap_or_default(),
    })
    .await?;

  let session_id = state.sessions.create(&user.user_id, &user.email);
  tracing::info!(user_id = %user.user_id, "login succeeded");

  let mut response = Json(json!({ "status": "success" })).into_response();
  let cookie = HeaderValue::from_str(&session_cookie(session_id))
    .map_err(|e| Error::Store(Box::new(e)))?;
  response.headers_mut().insert(header::SET_COOKIE, cookie);

  Ok(response)
}
