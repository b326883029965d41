//! Request handlers, one module per resource.

pub mod admin;
pub mod contact;
pub mod me;
pub mod scan;
pub mod signup;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tagcard_core::{store::SignupStore, tag::TagRecord};
use uuid::Uuid;

use crate::AppState;

/// A tag as shown to its owner or an administrator.
#[derive(Debug, Serialize)]
pub struct TagView {
  pub tag_id:     Uuid,
  pub account_id: Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub bound_at:   Option<DateTime<Utc>>,
  pub scan_url:   String,
}

impl TagView {
  pub fn new<S: SignupStore>(state: &AppState<S>, tag: TagRecord) -> Self {
    Self {
      scan_url:   state.scan_url(tag.tag_id),
      tag_id:     tag.tag_id,
      account_id: tag.account_id,
      created_at: tag.created_at,
      bound_at:   tag.bound_at,
    }
  }
}
