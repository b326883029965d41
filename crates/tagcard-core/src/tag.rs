//! Tag records and the routing decision produced when one is scanned.
//!
//! A tag is minted unbound and transitions exactly once, unbound → bound. The
//! owning account reference is never cleared or changed afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::Account;

/// A provisioned tag identifier and its (optional) owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
  pub tag_id:     Uuid,
  /// `None` while the tag is unclaimed.
  pub account_id: Option<Uuid>,
  pub created_at: DateTime<Utc>,
  /// Set in the same write that sets `account_id`.
  pub bound_at:   Option<DateTime<Utc>>,
}

impl TagRecord {
  /// A fresh, unbound record with the given id.
  pub fn unbound(tag_id: Uuid) -> Self {
    Self { tag_id, account_id: None, created_at: Utc::now(), bound_at: None }
  }

  pub fn is_bound(&self) -> bool { self.account_id.is_some() }
}

/// Which tags [`crate::store::TagRegistry::list_tags`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagFilter {
  #[default]
  All,
  Unbound,
  Bound,
}

/// Where a scanned tag should send the visitor.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RoutingDecision {
  /// The identifier is unknown: stale, forged, or mistyped.
  Invalid,
  /// The tag exists but nobody has claimed it yet.
  NeedsSignup { tag_id: Uuid },
  /// The tag is bound to `account`.
  ShowContact { account: Account },
}

/// Parse a tag identifier as it appears in a scanned URL.
///
/// Only the canonical hyphenated form is accepted; ids are always rendered
/// that way on the physical tag.
pub fn parse_tag_id(raw: &str) -> Option<Uuid> {
  let raw = raw.trim();
  if raw.len() != 36 {
    return None;
  }
  Uuid::parse_str(raw).ok()
}

/// Render a tag id the way it is printed on the tag.
pub fn format_tag_id(id: Uuid) -> String { id.hyphenated().to_string() }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_only_canonical_form() {
    let id = Uuid::new_v4();
    assert_eq!(parse_tag_id(&format_tag_id(id)), Some(id));
    assert_eq!(parse_tag_id(&id.simple().to_string()), None);
    assert_eq!(parse_tag_id("not-a-tag"), None);
    assert_eq!(parse_tag_id(""), None);
  }

  #[test]
  fn unbound_record_has_no_owner() {
    let record = TagRecord::unbound(Uuid::new_v4());
    assert!(!record.is_bound());
    assert!(record.bound_at.is_none());
  }

  #[test]
  fn routing_decision_serialises_with_tag() {
    let id = Uuid::nil();
    let json = serde_json::to_value(RoutingDecision::NeedsSignup { tag_id: id })
      .unwrap();
    assert_eq!(json["decision"], "needs_signup");
    assert_eq!(json["tag_id"], id.to_string());

    let json = serde_json::to_value(RoutingDecision::Invalid).unwrap();
    assert_eq!(json["decision"], "invalid");
  }
}
