//! Claiming an unbound tag by signing up.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  account::{Account, AccountInput, Role},
  identity::prepare,
  store::SignupStore,
};

/// Creates an account and binds it to a tag as one all-or-nothing unit.
pub struct SignupWorkflow<S> {
  store: Arc<S>,
}

impl<S> Clone for SignupWorkflow<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: SignupStore> SignupWorkflow<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Sign up through `tag_id`.
  ///
  /// The tag is checked before the (slow) password hash so a stale or claimed
  /// tag fails fast; the store re-checks inside its transaction, which is
  /// what actually decides a race. On any error no account exists
  /// afterwards.
  pub async fn signup_and_bind(
    &self,
    tag_id: Uuid,
    input: AccountInput,
  ) -> Result<Account> {
    let tag = self.store.lookup_tag(tag_id).await.map_err(Error::from_backend)?;
    if tag.is_bound() {
      return Err(Error::AlreadyBound(tag_id));
    }

    let new = prepare(input, Role::Standard)?;

    match self.store.create_account_and_bind(tag_id, new).await {
      Ok((account, _tag)) => {
        info!(%tag_id, account_id = %account.account_id, "tag claimed");
        Ok(account)
      }
      Err(e) => {
        let e: Error = e.into();
        if let Error::AlreadyBound(_) = e {
          warn!(%tag_id, "lost race to claim tag");
        }
        Err(e)
      }
    }
  }
}
