//! Error types for `tagcard-core`.
//!
//! This is the taxonomy every layer above the store speaks. Storage backends
//! keep their own error enums but must convert into [`Error`] without losing
//! the domain variants, so the web layer can map each one to a message.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Which unique account column a write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateField {
  Username,
  Email,
}

impl fmt::Display for DuplicateField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Username => "username",
      Self::Email => "email",
    })
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{field} is already taken")]
  Duplicate { field: DuplicateField },

  /// Unknown username and wrong password are deliberately the same error.
  #[error("invalid username or password")]
  InvalidCredentials,

  #[error("tag not found: {0}")]
  TagNotFound(Uuid),

  #[error("tag {0} is already bound to an account")]
  AlreadyBound(Uuid),

  #[error("account {account_id} already owns tag {tag_id}")]
  AccountAlreadyHasTag { account_id: Uuid, tag_id: Uuid },

  #[error("account not found: {0}")]
  AccountNotFound(Uuid),

  #[error("could not generate a unique tag id after {attempts} attempts")]
  Exhausted { attempts: u32 },

  #[error("administrator role required")]
  Forbidden,

  #[error("invalid {field}: {reason}")]
  Validation {
    field:  &'static str,
    reason: String,
  },

  #[error("password hashing failed: {0}")]
  PasswordHash(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Convert a store backend's error into the domain taxonomy.
  pub fn from_backend<E: Into<Error>>(e: E) -> Self { e.into() }

  pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
    Self::Validation { field, reason: reason.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
