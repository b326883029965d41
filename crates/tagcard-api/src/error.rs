//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every body is JSON of the form `{"error": "<message>"}`, with an extra
//! `field` key when the failure is tied to one input field. Internal failures
//! are logged and answered with a generic message.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use tagcard_core::Error as CoreError;
use thiserror::Error;
use uuid::Uuid;

const UNKNOWN_TAG: &str = "tag not recognized, try scanning again";
const ALREADY_CLAIMED: &str =
  "someone already claimed this tag, try scanning again";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  /// The scanned identifier is malformed or was never provisioned.
  #[error("unknown tag")]
  UnknownTag,

  /// The tag exists but has no owner yet, so there is no card to show.
  #[error("tag {0} has not been claimed")]
  Unclaimed(Uuid),

  /// No usable `Authorization: Basic` header.
  #[error("unauthorized")]
  Unauthorized,

  #[error("precondition failed")]
  PreconditionFailed,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::UnknownTag => message(StatusCode::NOT_FOUND, UNKNOWN_TAG),
      ApiError::Unclaimed(_) => {
        message(StatusCode::NOT_FOUND, "this tag has not been claimed yet")
      }
      ApiError::Unauthorized => unauthorized("authentication required"),
      ApiError::PreconditionFailed => message(
        StatusCode::PRECONDITION_FAILED,
        "profile was modified, reload and try again",
      ),
      ApiError::Core(e) => core_response(e),
    }
  }
}

fn core_response(e: CoreError) -> Response {
  match e {
    CoreError::TagNotFound(_) => message(StatusCode::NOT_FOUND, UNKNOWN_TAG),
    CoreError::AlreadyBound(_) => message(StatusCode::CONFLICT, ALREADY_CLAIMED),
    CoreError::Duplicate { field } => (
      StatusCode::CONFLICT,
      Json(json!({ "error": e.to_string(), "field": field })),
    )
      .into_response(),
    CoreError::AccountAlreadyHasTag { .. } => message(
      StatusCode::CONFLICT,
      "this account already has a tag",
    ),
    CoreError::InvalidCredentials => unauthorized(&e.to_string()),
    CoreError::Forbidden => message(StatusCode::FORBIDDEN, &e.to_string()),
    CoreError::Validation { field, .. } => (
      StatusCode::BAD_REQUEST,
      Json(json!({ "error": e.to_string(), "field": field })),
    )
      .into_response(),
    CoreError::AccountNotFound(_)
    | CoreError::Exhausted { .. }
    | CoreError::PasswordHash(_)
    | CoreError::Store(_) => {
      tracing::error!(error = %e, "request failed");
      message(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
  }
}

fn message(status: StatusCode, msg: &str) -> Response {
  (status, Json(json!({ "error": msg }))).into_response()
}

fn unauthorized(msg: &str) -> Response {
  let mut res = message(StatusCode::UNAUTHORIZED, msg);
  res.headers_mut().insert(
    header::WWW_AUTHENTICATE,
    HeaderValue::from_static("Basic realm=\"tagcard\""),
  );
  res
}
