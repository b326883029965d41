//! Handlers for claiming an unbound tag.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/signup/{tag_id}` | 404 if unknown, 409 if already claimed |
//! | `POST` | `/signup/{tag_id}` | Body: `{"username","email","password",…}`; 201 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Serialize;
use tagcard_core::{
  Error as CoreError,
  account::{AccountInput, PublicAccount},
  store::{SignupStore, TagRegistry},
  tag::parse_tag_id,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Form ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SignupForm {
  pub tag_id:    Uuid,
  pub claimable: bool,
}

/// `GET /signup/{tag_id}`
pub async fn form<S>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
) -> Result<Json<SignupForm>, ApiError>
where
  S: SignupStore,
{
  let tag_id = parse_tag_id(&raw).ok_or(ApiError::UnknownTag)?;
  let tag = state
    .store
    .lookup_tag(tag_id)
    .await
    .map_err(CoreError::from_backend)?;
  if tag.is_bound() {
    return Err(CoreError::AlreadyBound(tag_id).into());
  }
  Ok(Json(SignupForm { tag_id, claimable: true }))
}

// ─── Submit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SignupResponse {
  pub account:     PublicAccount,
  pub tag_id:      Uuid,
  pub contact_url: String,
}

/// `POST /signup/{tag_id}`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
  Json(input): Json<AccountInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SignupStore,
{
  let tag_id = parse_tag_id(&raw).ok_or(ApiError::UnknownTag)?;
  let account = state.signup.signup_and_bind(tag_id, input).await?;
  Ok((
    StatusCode::CREATED,
    Json(SignupResponse {
      account: account.public(),
      tag_id,
      contact_url: format!("/contact/{tag_id}"),
    }),
  ))
}
