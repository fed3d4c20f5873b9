//! Case-update endpoints — the append-only audit trail.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/add-case-update` | Body: `{case_id, text, new_status?}` |
//! | `GET`  | `/get-case-updates/{case_id}` | Newest first |

use axum::{
  Json,
  extract::{Path, State},
};
use casebook_core::{store::CaseStore, update::NewCaseUpdate};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::Error, handlers::cases::owned_case};

#[derive(Debug, Deserialize)]
pub struct AppendBody {
  pub case_id:    Uuid,
  pub text:       String,
  #[serde(default)]
  pub new_status: Option<String>,
}

/// `POST /add-case-update` — append an immutable note; a non-empty
/// `new_status` also moves the case's status.
pub async fn append<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<AppendBody>,
) -> Result<Json<Value>, Error>
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  if body.text.trim().is_empty() {
    return Err(Error::Validation("update text must not be empty".into()));
  }

  owned_case(&state, &user, body.case_id).await?;

  state
    .store
    .append_update(NewCaseUpdate {
      case_id:    body.case_id,
      user_email: user.email,
      text:       body.text,
      new_status: body.new_status,
    })
    .await?;

  Ok(Json(json!({ "status": "success" })))
}

/// `GET /get-case-updates/{case_id}` — full history, newest first. A
/// missing backing index surfaces as a 400 with a provisioning message,
/// never as an unsorted result.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(case_id): Path<Uuid>,
) -> Result<Json<Value>, Error>
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  owned_case(&state, &user, case_id).await?;

  let updates = state.store.list_updates(case_id).await?;
  Ok(Json(json!({ "status": "success", "updates": updates })))
}
