//! ETag computation for contact profiles.
//!
//! ETags are SHA-256 hashes over the owning account id and every profile
//! field in a fixed order, so two profiles with the same content share an
//! ETag and any edit changes it. A missing profile hashes like an empty one.

use sha2::{Digest, Sha256};
use tagcard_core::profile::ProfileFields;
use uuid::Uuid;

/// Compute the quoted ETag for `account_id`'s profile.
pub fn profile_etag(account_id: Uuid, fields: &ProfileFields) -> String {
  let links = &fields.links;
  let columns = [
    &fields.phone,
    &fields.address,
    &fields.description,
    &fields.photo_url,
    &links.linkedin,
    &links.whatsapp,
    &links.telegram,
    &links.facebook,
    &links.instagram,
    &links.twitter,
  ];

  let mut hasher = Sha256::new();
  hasher.update(account_id.as_bytes());
  for column in columns {
    match column {
      // Length-prefixed so adjacent fields cannot run together.
      Some(v) => {
        hasher.update([1u8]);
        hasher.update((v.len() as u64).to_le_bytes());
        hasher.update(v.as_bytes());
      }
      None => hasher.update([0u8]),
    }
  }
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Strip the surrounding double-quotes (and an optional weak prefix) from an
/// ETag header value.
pub fn strip_etag_quotes(s: &str) -> &str {
  s.trim().trim_start_matches("W/").trim_matches('"')
}

/// Whether an `If-Match` header value admits the current ETag.
pub fn if_match_allows(header: &str, current: &str) -> bool {
  header.split(',').any(|candidate| {
    let candidate = candidate.trim();
    candidate == "*" || strip_etag_quotes(candidate) == strip_etag_quotes(current)
  })
}
