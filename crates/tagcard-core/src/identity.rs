//! Account creation, credential checks, and the authenticated principal.

use std::sync::Arc;

use tracing::info;

use crate::{
  Error, Result,
  account::{Account, AccountInput, NewAccount, Role},
  password,
  store::IdentityStore,
};

/// An account whose credentials have been verified for the current request.
///
/// Only [`Accounts::authenticate`] constructs one, so holding a `Principal` is
/// proof of authentication.
#[derive(Debug, Clone)]
pub struct Principal {
  account: Account,
}

impl Principal {
  pub fn account(&self) -> &Account { &self.account }

  pub fn into_account(self) -> Account { self.account }

  /// The account, if it holds the administrator role.
  pub fn require_administrator(&self) -> Result<&Account> {
    if self.account.is_administrator() {
      Ok(&self.account)
    } else {
      Err(Error::Forbidden)
    }
  }
}

/// Identity operations over an [`IdentityStore`].
pub struct Accounts<I> {
  store: Arc<I>,
}

impl<I> Clone for Accounts<I> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<I: IdentityStore> Accounts<I> {
  pub fn new(store: Arc<I>) -> Self { Self { store } }

  /// Validate `input`, hash its password and persist a new account.
  pub async fn create_account(
    &self,
    input: AccountInput,
    role: Role,
  ) -> Result<Account> {
    let new = prepare(input, role)?;
    let account = self
      .store
      .insert_account(new)
      .await
      .map_err(Error::from_backend)?;
    info!(
      account_id = %account.account_id,
      username = %account.username,
      ?role,
      "account created"
    );
    Ok(account)
  }

  /// Return the account for `username` if `password` matches.
  ///
  /// Unknown usernames and wrong passwords both yield
  /// [`Error::InvalidCredentials`].
  pub async fn verify_credentials(
    &self,
    username: &str,
    password: &str,
  ) -> Result<Account> {
    let found = self
      .store
      .find_account_by_username(username.trim())
      .await
      .map_err(Error::from_backend)?;

    match found {
      Some(account)
        if password::verify_password(password, &account.password_hash) =>
      {
        Ok(account)
      }
      Some(_) => Err(Error::InvalidCredentials),
      None => {
        password::verify_against_dummy(password);
        Err(Error::InvalidCredentials)
      }
    }
  }

  pub async fn authenticate(
    &self,
    username: &str,
    password: &str,
  ) -> Result<Principal> {
    let account = self.verify_credentials(username, password).await?;
    Ok(Principal { account })
  }

  /// Promote an existing account to administrator.
  pub async fn grant_administrator(&self, username: &str) -> Result<Account> {
    let account = self
      .store
      .find_account_by_username(username.trim())
      .await
      .map_err(Error::from_backend)?
      .ok_or_else(|| Error::validation("username", "no such account"))?;
    let account = self
      .store
      .set_role(account.account_id, Role::Administrator)
      .await
      .map_err(Error::from_backend)?;
    info!(account_id = %account.account_id, "administrator role granted");
    Ok(account)
  }
}

/// Validate and hash an [`AccountInput`] into a store-ready [`NewAccount`].
pub(crate) fn prepare(input: AccountInput, role: Role) -> Result<NewAccount> {
  let input = input.validated()?;
  let password_hash = password::hash_password(&input.password)?;
  Ok(NewAccount {
    username: input.username,
    email: input.email,
    password_hash,
    first_name: input.first_name,
    last_name: input.last_name,
    role,
  })
}
