//! Handlers for `/admin` endpoints. Every request must authenticate as an
//! administrator.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/tags` | Optional `?status=all\|unbound\|bound` |
//! | `POST` | `/admin/tags` | Body: `{"count":10}`; 201 with the minted tags |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tagcard_core::{
  Error as CoreError,
  store::{SignupStore, TagRegistry},
  tag::TagFilter,
};

use crate::{AppState, auth::Administrator, error::ApiError, handlers::TagView};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub status: TagFilter,
}

/// `GET /admin/tags[?status=<filter>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _admin: Administrator,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<TagView>>, ApiError>
where
  S: SignupStore + 'static,
{
  let tags = state
    .store
    .list_tags(params.status)
    .await
    .map_err(CoreError::from_backend)?;
  Ok(Json(tags.into_iter().map(|t| TagView::new(&state, t)).collect()))
}

// ─── Provision ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProvisionBody {
  pub count: u32,
}

/// `POST /admin/tags`
pub async fn provision<S>(
  State(state): State<AppState<S>>,
  Administrator(admin): Administrator,
  Json(body): Json<ProvisionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SignupStore + 'static,
{
  let minted = state.provisioner.provision_tags(body.count).await?;
  tracing::info!(
    admin = %admin.account().username,
    count = minted.len(),
    "tags provisioned"
  );
  let views: Vec<TagView> =
    minted.into_iter().map(|t| TagView::new(&state, t)).collect();
  Ok((StatusCode::CREATED, Json(views)))
}
