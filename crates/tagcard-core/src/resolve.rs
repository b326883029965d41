//! Scan-time tag resolution.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  store::{IdentityStore, TagRegistry},
  tag::{RoutingDecision, parse_tag_id},
};

/// Decides where a scanned tag sends the visitor. Read-only; calling it any
/// number of times never changes state.
pub struct TagResolver<R, I> {
  registry: Arc<R>,
  identity: Arc<I>,
}

impl<R, I> Clone for TagResolver<R, I> {
  fn clone(&self) -> Self {
    Self {
      registry: Arc::clone(&self.registry),
      identity: Arc::clone(&self.identity),
    }
  }
}

impl<R: TagRegistry, I: IdentityStore> TagResolver<R, I> {
  pub fn new(registry: Arc<R>, identity: Arc<I>) -> Self {
    Self { registry, identity }
  }

  pub async fn resolve(&self, tag_id: Uuid) -> Result<RoutingDecision> {
    let tag = self
      .registry
      .get_tag(tag_id)
      .await
      .map_err(Error::from_backend)?;
    let Some(tag) = tag else {
      return Ok(RoutingDecision::Invalid);
    };

    let Some(account_id) = tag.account_id else {
      return Ok(RoutingDecision::NeedsSignup { tag_id });
    };

    // A bound tag pointing at a missing account is an integrity failure,
    // not an invalid tag.
    let account = self
      .identity
      .get_account(account_id)
      .await
      .map_err(Error::from_backend)?
      .ok_or(Error::AccountNotFound(account_id))?;

    Ok(RoutingDecision::ShowContact { account })
  }

  /// Resolve an identifier straight from a URL. Anything that is not a
  /// canonical tag id is [`RoutingDecision::Invalid`].
  pub async fn resolve_str(&self, raw: &str) -> Result<RoutingDecision> {
    match parse_tag_id(raw) {
      Some(tag_id) => self.resolve(tag_id).await,
      None => Ok(RoutingDecision::Invalid),
    }
  }
}
