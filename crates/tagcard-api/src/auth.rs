//! HTTP Basic-auth extractors.
//!
//! The principal is re-established on every request from the
//! `Authorization` header and handed to the handler explicitly; nothing is
//! kept in a session.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use tagcard_core::{Principal, store::SignupStore};

use crate::{AppState, error::ApiError};

/// An authenticated account.
pub struct Authenticated(pub Principal);

/// An authenticated account holding the administrator role.
pub struct Administrator(pub Principal);

/// Split a `Basic` authorization header into `(username, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = value
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((username.to_owned(), password.to_owned()))
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: SignupStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (username, password) = basic_credentials(&parts.headers)?;
    let principal = state.accounts.authenticate(&username, &password).await?;
    Ok(Authenticated(principal))
  }
}

impl<S> FromRequestParts<AppState<S>> for Administrator
where
  S: SignupStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Authenticated(principal) =
      Authenticated::from_request_parts(parts, state).await?;
    principal.require_administrator()?;
    Ok(Administrator(principal))
  }
}
