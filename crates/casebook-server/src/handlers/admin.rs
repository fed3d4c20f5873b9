//! Admin endpoints — the user roster and manual user creation.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin-panel` | Roster of all users, no pagination |
//! | `POST` | `/admin/create-user` | 409 when the id is taken |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use casebook_core::{
  store::CaseStore,
  user::{NewUser, User},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::Error};

/// One row of the admin roster. `role` is defaulted here so the view
/// never shows an empty cell.
#[derive(Debug, Serialize)]
pub struct RosterEntry {
  pub id:           String,
  pub display_name: String,
  pub email:        String,
  pub role:         String,
  pub last_login:   Option<DateTime<Utc>>,
}

impl From<User> for RosterEntry {
  fn from(user: User) -> Self {
    Self {
      id:           user.user_id,
      display_name: user.display_name,
      email:        user.email,
      role:         user.role.unwrap_or_else(|| "Unassigned".to_owned()),
      last_login:   user.last_login,
    }
  }
}

/// `GET /admin-panel`
pub async fn roster<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
) -> Result<Json<Value>, Error>
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  let users: Vec<RosterEntry> = state
    .store
    .list_users()
    .await?
    .into_iter()
    .map(RosterEntry::from)
    .collect();

  Ok(Json(json!({ "status": "success", "users": users })))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
  /// Provider id; generated when absent so manually created users can
  /// exist before their first login.
  pub id:           Option<String>,
  pub email:        String,
  #[serde(default)]
  pub display_name: Option<String>,
  #[serde(default)]
  pub role:         Option<String>,
}

/// `POST /admin/create-user`
pub async fn create_user<S>(
  State(state): State<AppState<S>>,
  _user: CurrentUser,
  Json(body): Json<CreateUserBody>,
) -> Result<impl IntoResponse, Error>
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  if body.email.trim().is_empty() {
    return Err(Error::Validation("email must not be empty".into()));
  }

  let input = NewUser {
    user_id:      body.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
    email:        body.email,
    display_name: body.display_name.unwrap_or_default(),
  };

  let user = state.store.create_user(input, body.role).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "status": "success", "user": user })),
  ))
}
