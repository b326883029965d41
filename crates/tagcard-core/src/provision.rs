//! Minting unbound tag identifiers ahead of printing physical tags.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{Error, Result, store::TagRegistry, tag::TagRecord};

/// How many fresh ids to try before giving up on a single tag.
pub const MAX_PROVISION_ATTEMPTS: u32 = 5;

/// Default upper bound on one bulk request.
pub const DEFAULT_MAX_BATCH: u32 = 500;

/// Generates new unbound tags in a [`TagRegistry`].
pub struct Provisioner<R> {
  registry:  Arc<R>,
  max_batch: u32,
}

impl<R> Clone for Provisioner<R> {
  fn clone(&self) -> Self {
    Self { registry: Arc::clone(&self.registry), max_batch: self.max_batch }
  }
}

impl<R: TagRegistry> Provisioner<R> {
  pub fn new(registry: Arc<R>) -> Self {
    Self { registry, max_batch: DEFAULT_MAX_BATCH }
  }

  pub fn with_max_batch(mut self, max_batch: u32) -> Self {
    self.max_batch = max_batch;
    self
  }

  pub fn max_batch(&self) -> u32 { self.max_batch }

  /// Mint one tag with a random (v4) identifier.
  pub async fn provision_tag(&self) -> Result<TagRecord> {
    self.provision_tag_with(Uuid::new_v4).await
  }

  /// Mint one tag, drawing candidate identifiers from `next_id` until one is
  /// free or [`MAX_PROVISION_ATTEMPTS`] have collided.
  pub async fn provision_tag_with<F>(&self, mut next_id: F) -> Result<TagRecord>
  where
    F: FnMut() -> Uuid,
  {
    for attempt in 1..=MAX_PROVISION_ATTEMPTS {
      let record = TagRecord::unbound(next_id());
      let tag_id = record.tag_id;
      let inserted = self
        .registry
        .insert_tag(record.clone())
        .await
        .map_err(Error::from_backend)?;
      if inserted {
        info!(%tag_id, "tag provisioned");
        return Ok(record);
      }
      warn!(%tag_id, attempt, "tag id collision");
    }

    error!(attempts = MAX_PROVISION_ATTEMPTS, "tag id generation exhausted");
    Err(Error::Exhausted { attempts: MAX_PROVISION_ATTEMPTS })
  }

  /// Mint `count` tags. Stops at the first failure; tags minted before it
  /// remain provisioned.
  pub async fn provision_tags(&self, count: u32) -> Result<Vec<TagRecord>> {
    if count == 0 || count > self.max_batch {
      return Err(Error::validation(
        "count",
        format!("must be between 1 and {}", self.max_batch),
      ));
    }
    let mut minted = Vec::with_capacity(count as usize);
    for _ in 0..count {
      minted.push(self.provision_tag().await?);
    }
    Ok(minted)
  }
}
