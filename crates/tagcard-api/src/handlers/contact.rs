//! `GET /contact/{tag_id}`: the card shown to whoever scans a bound tag.

use axum::{
  Json,
  extract::{Path, State},
  http::header,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tagcard_core::{
  Error as CoreError,
  account::PublicAccount,
  profile::ProfileFields,
  store::{ProfileStore, SignupStore},
  tag::{RoutingDecision, parse_tag_id},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError, etag::profile_etag};

#[derive(Debug, Serialize)]
pub struct ContactCard {
  pub tag_id:     Uuid,
  pub account:    PublicAccount,
  pub profile:    ProfileFields,
  pub updated_at: Option<DateTime<Utc>>,
}

pub async fn card<S>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SignupStore,
{
  let tag_id = parse_tag_id(&raw).ok_or(ApiError::UnknownTag)?;
  let account = match state.resolver.resolve(tag_id).await? {
    RoutingDecision::ShowContact { account } => account,
    RoutingDecision::NeedsSignup { .. } => return Err(ApiError::Unclaimed(tag_id)),
    RoutingDecision::Invalid => return Err(ApiError::UnknownTag),
  };

  let profile = state
    .store
    .get_profile(account.account_id)
    .await
    .map_err(CoreError::from_backend)?;
  let (profile, updated_at) = match profile {
    Some(p) => (p.fields, Some(p.updated_at)),
    None => (ProfileFields::default(), None),
  };

  let etag = profile_etag(account.account_id, &profile);
  let card = ContactCard { tag_id, account: account.public(), profile, updated_at };
  Ok(([(header::ETAG, etag)], Json(card)))
}
