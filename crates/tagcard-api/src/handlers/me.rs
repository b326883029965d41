//! Handlers for the authenticated principal.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me` | Account and bound tag |
//! | `GET`  | `/me/profile` | Profile with `ETag` |
//! | `PUT`  | `/me/profile` | Full replace; optional `If-Match`, 412 on mismatch |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, header},
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tagcard_core::{
  Error as CoreError,
  account::{PublicAccount, Role},
  profile::ProfileFields,
  store::{ProfileStore, SignupStore, TagRegistry},
};
use uuid::Uuid;

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  etag::{if_match_allows, profile_etag},
  handlers::TagView,
};

// ─── Who am I ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Me {
  pub account: PublicAccount,
  pub role:    Role,
  pub tag:     Option<TagView>,
}

/// `GET /me`
pub async fn whoami<S>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
) -> Result<Json<Me>, ApiError>
where
  S: SignupStore + 'static,
{
  let account = principal.into_account();
  let tag = state
    .store
    .tag_for_account(account.account_id)
    .await
    .map_err(CoreError::from_backend)?
    .map(|t| TagView::new(&state, t));
  Ok(Json(Me { account: account.public(), role: account.role, tag }))
}

// ─── Profile ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProfileBody {
  #[serde(flatten)]
  pub fields:     ProfileFields,
  pub updated_at: Option<DateTime<Utc>>,
}

async fn current_profile<S>(
  state: &AppState<S>,
  account_id: Uuid,
) -> Result<ProfileBody, ApiError>
where
  S: SignupStore,
{
  let profile = state
    .store
    .get_profile(account_id)
    .await
    .map_err(CoreError::from_backend)?;
  Ok(match profile {
    Some(p) => ProfileBody { fields: p.fields, updated_at: Some(p.updated_at) },
    None => ProfileBody { fields: ProfileFields::default(), updated_at: None },
  })
}

/// `GET /me/profile`
pub async fn get_profile<S>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
) -> Result<impl IntoResponse, ApiError>
where
  S: SignupStore + 'static,
{
  let account_id = principal.account().account_id;
  let body = current_profile(&state, account_id).await?;
  let etag = profile_etag(account_id, &body.fields);
  Ok(([(header::ETAG, etag)], Json(body)))
}

/// `PUT /me/profile`: body is the complete set of fields; any field left out
/// is cleared.
///
/// The `If-Match` comparison and the write are separate store calls, so two
/// writers racing with the same ETag can both succeed; the later one wins.
pub async fn put_profile<S>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  headers: HeaderMap,
  Json(fields): Json<ProfileFields>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SignupStore + 'static,
{
  let account_id = principal.account().account_id;

  if let Some(if_match) = headers.get(header::IF_MATCH) {
    let if_match = if_match.to_str().map_err(|_| ApiError::PreconditionFailed)?;
    let current = current_profile(&state, account_id).await?;
    if !if_match_allows(if_match, &profile_etag(account_id, &current.fields)) {
      return Err(ApiError::PreconditionFailed);
    }
  }

  let saved = state
    .store
    .upsert_profile(account_id, fields)
    .await
    .map_err(CoreError::from_backend)?;
  tracing::info!(%account_id, "profile updated");

  let etag = profile_etag(account_id, &saved.fields);
  let body = ProfileBody { fields: saved.fields, updated_at: Some(saved.updated_at) };
  Ok(([(header::ETAG, etag)], Json(body)))
}
