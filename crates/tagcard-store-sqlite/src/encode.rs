//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so lexical order is chronological order. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use tagcard_core::{
  account::{Account, Role},
  profile::{ContactProfile, ProfileFields, ProfileLinks},
  tag::TagRecord,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ─────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str {
  match role {
    Role::Standard => "standard",
    Role::Administrator => "administrator",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "standard" => Ok(Role::Standard),
    "administrator" => Ok(Role::Administrator),
    other => Err(Error::UnknownRole(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const ACCOUNT_COLUMNS: &str = "account_id, username, email, password_hash, \
                                   first_name, last_name, role, created_at";

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:    String,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub role:          String,
  pub created_at:    String,
}

impl RawAccount {
  /// Map a row selected with [`ACCOUNT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:    row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      first_name:    row.get(4)?,
      last_name:     row.get(5)?,
      role:          row.get(6)?,
      created_at:    row.get(7)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:    decode_uuid(&self.account_id)?,
      username:      self.username,
      email:         self.email,
      password_hash: self.password_hash,
      first_name:    self.first_name,
      last_name:     self.last_name,
      role:          decode_role(&self.role)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const TAG_COLUMNS: &str = "tag_id, account_id, created_at, bound_at";

/// Raw strings read directly from a `tag_records` row.
pub struct RawTag {
  pub tag_id:     String,
  pub account_id: Option<String>,
  pub created_at: String,
  pub bound_at:   Option<String>,
}

impl RawTag {
  /// Map a row selected with [`TAG_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tag_id:     row.get(0)?,
      account_id: row.get(1)?,
      created_at: row.get(2)?,
      bound_at:   row.get(3)?,
    })
  }

  pub fn into_tag(self) -> Result<TagRecord> {
    Ok(TagRecord {
      tag_id:     decode_uuid(&self.tag_id)?,
      account_id: self.account_id.as_deref().map(decode_uuid).transpose()?,
      created_at: decode_dt(&self.created_at)?,
      bound_at:   self.bound_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const PROFILE_COLUMNS: &str = "account_id, phone, address, description, \
                                   photo_url, linkedin, whatsapp, telegram, \
                                   facebook, instagram, twitter, updated_at";

/// Raw strings read directly from a `contact_profiles` row.
pub struct RawProfile {
  pub account_id: String,
  pub fields:     ProfileFields,
  pub updated_at: String,
}

impl RawProfile {
  /// Map a row selected with [`PROFILE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id: row.get(0)?,
      fields:     ProfileFields {
        phone:       row.get(1)?,
        address:     row.get(2)?,
        description: row.get(3)?,
        photo_url:   row.get(4)?,
        links:       ProfileLinks {
          linkedin:  row.get(5)?,
          whatsapp:  row.get(6)?,
          telegram:  row.get(7)?,
          facebook:  row.get(8)?,
          instagram: row.get(9)?,
          twitter:   row.get(10)?,
        },
      },
      updated_at: row.get(11)?,
    })
  }

  pub fn into_profile(self) -> Result<ContactProfile> {
    Ok(ContactProfile {
      account_id: decode_uuid(&self.account_id)?,
      fields:     self.fields,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
