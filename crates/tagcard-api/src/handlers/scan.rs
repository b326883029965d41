//! Handlers for scanned tags.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tag/{tag_id}` | 303 to `/signup/…` or `/contact/…`; 404 if unknown |
//! | `GET`  | `/api/tags/{tag_id}` | The routing decision as JSON; always 200 |

use axum::{
  Json,
  extract::{Path, State},
  response::Redirect,
};
use serde::Serialize;
use tagcard_core::{
  account::PublicAccount,
  store::SignupStore,
  tag::{RoutingDecision, parse_tag_id},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `GET /tag/{tag_id}`
pub async fn redirect<S>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
) -> Result<Redirect, ApiError>
where
  S: SignupStore,
{
  let Some(tag_id) = parse_tag_id(&raw) else {
    tracing::debug!(tag = %raw, "scan of malformed tag id");
    return Err(ApiError::UnknownTag);
  };
  match state.resolver.resolve(tag_id).await? {
    RoutingDecision::Invalid => {
      tracing::debug!(%tag_id, "scan of unknown tag");
      Err(ApiError::UnknownTag)
    }
    RoutingDecision::NeedsSignup { .. } => {
      Ok(Redirect::to(&format!("/signup/{tag_id}")))
    }
    RoutingDecision::ShowContact { .. } => {
      Ok(Redirect::to(&format!("/contact/{tag_id}")))
    }
  }
}

/// JSON rendering of a [`RoutingDecision`]; the owner is shown only through
/// their public fields.
#[derive(Debug, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum DecisionBody {
  Invalid,
  NeedsSignup { tag_id: Uuid, signup_url: String },
  ShowContact { tag_id: Uuid, account: PublicAccount },
}

/// `GET /api/tags/{tag_id}`
pub async fn decision<S>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
) -> Result<Json<DecisionBody>, ApiError>
where
  S: SignupStore,
{
  let Some(tag_id) = parse_tag_id(&raw) else {
    return Ok(Json(DecisionBody::Invalid));
  };
  let body = match state.resolver.resolve(tag_id).await? {
    RoutingDecision::Invalid => DecisionBody::Invalid,
    RoutingDecision::NeedsSignup { tag_id } => DecisionBody::NeedsSignup {
      tag_id,
      signup_url: format!("/signup/{tag_id}"),
    },
    RoutingDecision::ShowContact { account } => {
      DecisionBody::ShowContact { tag_id, account: account.public() }
    }
  };
  Ok(Json(body))
}
