//! Case endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/` | Dashboard data: the caller's cases + client config |
//! | `POST`  | `/create-case` | Body: case fields, all optional |
//! | `GET`   | `/get-cases` | 401 when unauthenticated |
//! | `PATCH` | `/update-case/{case_id}` | 404 unknown case, 403 non-owner |

use axum::{
  Json,
  extract::{Path, State},
};
use casebook_core::{
  case::{Case, CasePatch, NewCase},
  store::CaseStore,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::Error};

/// Fetch a case and confirm the caller owns it. Ownership mismatches are
/// reported as 403, unknown cases as 404.
pub async fn owned_case<S>(
  state: &AppState<S>,
  user: &CurrentUser,
  case_id: Uuid,
) -> Result<Case, Error>
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  let case = state
    .store
    .get_case(case_id)
    .await?
    .ok_or(Error::CaseNotFound(case_id))?;

  if case.user_id != user.user_id {
    return Err(Error::Forbidden);
  }
  Ok(case)
}

/// `GET /` — everything the dashboard renders from. A store failure here
/// degrades to an empty case list rather than an error page.
pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Json<Value>
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  let cases = match state.store.list_cases(&user.user_id).await {
    Ok(cases) => cases,
    Err(e) => {
      tracing::warn!(error = %e, "failed to fetch cases for dashboard");
      Vec::new()
    }
  };

  Json(json!({
    "status": "success",
    "cases": cases,
    "identity": state.config.identity.client_view(),
  }))
}

/// `POST /create-case`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<NewCase>,
) -> Result<Json<Value>, Error>
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  let case = state.store.create_case(&user.user_id, body).await?;
  Ok(Json(json!({ "status": "success", "case": case })))
}

/// `GET /get-cases`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<Value>, Error>
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  let cases = state.store.list_cases(&user.user_id).await?;
  Ok(Json(json!({ "status": "success", "cases": cases })))
}

/// `PATCH /update-case/{case_id}` — persists the patch onto the stored
/// record (not an echo) and bumps `updated_at`.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(case_id): Path<Uuid>,
  Json(patch): Json<CasePatch>,
) -> Result<Json<Value>, Error>
where
  S: CaseStore + Clone + Send + Sync + 'static,
{
  if patch.is_empty() {
    return Err(Error::Validation("no fields to update".into()));
  }

  owned_case(&state, &user, case_id).await?;

  let case = state.store.update_case(case_id, patch).await?;
  Ok(Json(json!({ "status": "success", "case": case })))
}
