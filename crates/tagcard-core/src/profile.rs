//! Contact profiles: the card shown to whoever scans a bound tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::clean;

/// Links to the owner's accounts on other services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileLinks {
  pub linkedin:  Option<String>,
  pub whatsapp:  Option<String>,
  pub telegram:  Option<String>,
  pub facebook:  Option<String>,
  pub instagram: Option<String>,
  pub twitter:   Option<String>,
}

/// The editable contact fields. Every field is optional.
///
/// Writes replace the whole set: a field missing from the input is stored as
/// empty, it does not keep its previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFields {
  pub phone:       Option<String>,
  pub address:     Option<String>,
  pub description: Option<String>,
  pub photo_url:   Option<String>,
  pub links:       ProfileLinks,
}

impl ProfileFields {
  /// Trim every field and turn blank strings into `None`.
  pub fn normalized(self) -> Self {
    Self {
      phone:       clean(self.phone),
      address:     clean(self.address),
      description: clean(self.description),
      photo_url:   clean(self.photo_url),
      links:       ProfileLinks {
        linkedin:  clean(self.links.linkedin),
        whatsapp:  clean(self.links.whatsapp),
        telegram:  clean(self.links.telegram),
        facebook:  clean(self.links.facebook),
        instagram: clean(self.links.instagram),
        twitter:   clean(self.links.twitter),
      },
    }
  }

  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

/// A persisted profile; at most one per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactProfile {
  pub account_id: Uuid,
  #[serde(flatten)]
  pub fields:     ProfileFields,
  pub updated_at: DateTime<Utc>,
}
