//! Accounts, the root entity every tag binding and profile hangs off.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

const USERNAME_MAX_LEN: usize = 64;
const EMAIL_MAX_LEN: usize = 254;
const PASSWORD_MAX_LEN: usize = 1024;

/// What an account is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  Standard,
  Administrator,
}

/// A persisted account.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
  pub account_id:    Uuid,
  /// Unique and immutable once created.
  pub username:      String,
  /// Unique; stored trimmed and lowercased.
  pub email:         String,
  /// argon2 PHC string. Never leaves the process.
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub role:          Role,
  pub created_at:    DateTime<Utc>,
}

impl Account {
  pub fn is_administrator(&self) -> bool { self.role == Role::Administrator }

  /// The subset of the account that may be shown to anyone who scans the
  /// bound tag.
  pub fn public(&self) -> PublicAccount {
    PublicAccount {
      account_id: self.account_id,
      username:   self.username.clone(),
      email:      self.email.clone(),
      first_name: self.first_name.clone(),
      last_name:  self.last_name.clone(),
    }
  }
}

/// Public projection of an [`Account`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAccount {
  pub account_id: Uuid,
  pub username:   String,
  pub email:      String,
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Caller-supplied fields for creating an account. The password is plaintext
/// here and is hashed before anything reaches a store.
#[derive(Clone, Default, Deserialize)]
pub struct AccountInput {
  pub username:   String,
  pub email:      String,
  pub password:   String,
  #[serde(default)]
  pub first_name: Option<String>,
  #[serde(default)]
  pub last_name:  Option<String>,
}

impl fmt::Debug for AccountInput {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AccountInput")
      .field("username", &self.username)
      .field("email", &self.email)
      .field("password", &"<redacted>")
      .field("first_name", &self.first_name)
      .field("last_name", &self.last_name)
      .finish()
  }
}

impl AccountInput {
  pub fn new(
    username: impl Into<String>,
    email: impl Into<String>,
    password: impl Into<String>,
  ) -> Self {
    Self {
      username: username.into(),
      email: email.into(),
      password: password.into(),
      first_name: None,
      last_name: None,
    }
  }

  /// Check and canonicalise every field, returning the cleaned input.
  pub fn validated(self) -> Result<Self> {
    let username = self.username.trim().to_owned();
    if username.is_empty() {
      return Err(Error::validation("username", "must not be empty"));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
      return Err(Error::validation(
        "username",
        format!("must be at most {USERNAME_MAX_LEN} characters"),
      ));
    }
    if !username
      .chars()
      .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
      return Err(Error::validation(
        "username",
        "may only contain letters, digits, '_', '-' and '.'",
      ));
    }

    let email = self.email.trim().to_lowercase();
    if email.len() > EMAIL_MAX_LEN {
      return Err(Error::validation("email", "is too long"));
    }
    match email.split_once('@') {
      Some((local, domain))
        if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {}
      _ => return Err(Error::validation("email", "is not an email address")),
    }

    if self.password.is_empty() {
      return Err(Error::validation("password", "must not be empty"));
    }
    if self.password.len() > PASSWORD_MAX_LEN {
      return Err(Error::validation("password", "is too long"));
    }

    Ok(Self {
      username,
      email,
      password: self.password,
      first_name: clean(self.first_name),
      last_name: clean(self.last_name),
    })
  }
}

/// Input to [`crate::store::IdentityStore::insert_account`]. Already
/// validated and hashed; `account_id` and `created_at` are set by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub role:          Role,
}

/// Trim a free-text field; blank becomes `None`.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validation_canonicalises_email_and_names() {
    let mut input = AccountInput::new("  alice ", " Alice@Example.COM ", "pw");
    input.first_name = Some("  ".into());
    input.last_name = Some(" Liddell ".into());

    let clean = input.validated().unwrap();
    assert_eq!(clean.username, "alice");
    assert_eq!(clean.email, "alice@example.com");
    assert_eq!(clean.first_name, None);
    assert_eq!(clean.last_name.as_deref(), Some("Liddell"));
  }

  #[test]
  fn short_passwords_are_accepted() {
    assert!(AccountInput::new("bob", "b@x.com", "pw").validated().is_ok());
  }

  #[test]
  fn rejects_bad_fields() {
    let cases = [
      AccountInput::new("", "a@x.com", "pw"),
      AccountInput::new("has space", "a@x.com", "pw"),
      AccountInput::new("alice", "not-an-email", "pw"),
      AccountInput::new("alice", "a@b@c", "pw"),
      AccountInput::new("alice", "a@x.com", ""),
    ];
    for input in cases {
      assert!(
        matches!(input.clone().validated(), Err(Error::Validation { .. })),
        "{input:?} should be rejected"
      );
    }
  }

  #[test]
  fn debug_never_prints_password() {
    let input = AccountInput::new("alice", "a@x.com", "hunter2");
    assert!(!format!("{input:?}").contains("hunter2"));
  }

  #[test]
  fn administrator_predicate_follows_role() {
    let mut account = Account {
      account_id:    Uuid::new_v4(),
      username:      "alice".into(),
      email:         "a@x.com".into(),
      password_hash: String::new(),
      first_name:    None,
      last_name:     None,
      role:          Role::Standard,
      created_at:    Utc::now(),
    };
    assert!(!account.is_administrator());
    account.role = Role::Administrator;
    assert!(account.is_administrator());
  }
}
