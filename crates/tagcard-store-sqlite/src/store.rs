//! [`SqliteStore`]: the SQLite implementation of the tagcard store traits.
//!
//! Every multi-statement operation runs inside a single `conn.call` closure,
//! and those closures execute one at a time on the connection's thread. Domain
//! failures found inside a closure are returned as the inner `Err` of an
//! [`Outcome`] so the enclosing transaction can be dropped (rolled back)
//! without being mistaken for a database error.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};
use tracing::debug;
use uuid::Uuid;

use tagcard_core::{
  DuplicateField, Error as CoreError,
  account::{Account, NewAccount, Role},
  profile::{ContactProfile, ProfileFields},
  store::{IdentityStore, ProfileStore, SignupStore, Store, TagRegistry},
  tag::{TagFilter, TagRecord},
};

use crate::{
  Error, Result,
  encode::{
    ACCOUNT_COLUMNS, PROFILE_COLUMNS, RawAccount, RawProfile, RawTag,
    TAG_COLUMNS, encode_dt, encode_role, encode_uuid,
  },
  schema::SCHEMA,
};

/// Result of a closure that may fail for a domain reason.
type Outcome<T> = std::result::Result<T, CoreError>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tagcard store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    debug!(path = %path.display(), "store opened");
    Ok(store)
  }

  /// Open a private in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers (run on the connection thread) ──────────────────────────────

fn account_exists(conn: &Connection, account_id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM accounts WHERE account_id = ?1",
        params![account_id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn duplicate_field(
  conn: &Connection,
  username: &str,
  email: &str,
) -> rusqlite::Result<Option<DuplicateField>> {
  let taken = |sql: &str, value: &str| -> rusqlite::Result<bool> {
    Ok(conn.query_row(sql, params![value], |_| Ok(())).optional()?.is_some())
  };
  if taken("SELECT 1 FROM accounts WHERE username = ?1", username)? {
    return Ok(Some(DuplicateField::Username));
  }
  if taken("SELECT 1 FROM accounts WHERE email = ?1", email)? {
    return Ok(Some(DuplicateField::Email));
  }
  Ok(None)
}

/// Which account column a UNIQUE violation was raised for, if any.
fn violated_account_field(e: &rusqlite::Error) -> Option<DuplicateField> {
  match e {
    rusqlite::Error::SqliteFailure(err, Some(msg))
      if err.code == rusqlite::ErrorCode::ConstraintViolation =>
    {
      if msg.contains("accounts.username") {
        Some(DuplicateField::Username)
      } else if msg.contains("accounts.email") {
        Some(DuplicateField::Email)
      } else {
        None
      }
    }
    _ => None,
  }
}

fn uuid_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
  let raw: String = row.get(idx)?;
  Uuid::parse_str(&raw).map_err(|e| {
    rusqlite::Error::FromSqlConversionFailure(
      idx,
      rusqlite::types::Type::Text,
      Box::new(e),
    )
  })
}

fn insert_account_row(
  conn: &Connection,
  account: &Account,
) -> rusqlite::Result<Outcome<()>> {
  if let Some(field) = duplicate_field(conn, &account.username, &account.email)? {
    return Ok(Err(CoreError::Duplicate { field }));
  }

  let inserted = conn.execute(
    &format!("INSERT INTO accounts ({ACCOUNT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
    params![
      encode_uuid(account.account_id),
      account.username,
      account.email,
      account.password_hash,
      account.first_name,
      account.last_name,
      encode_role(account.role),
      encode_dt(account.created_at),
    ],
  );

  match inserted {
    Ok(_) => Ok(Ok(())),
    Err(e) => match violated_account_field(&e) {
      Some(field) => Ok(Err(CoreError::Duplicate { field })),
      None => Err(e),
    },
  }
}

fn load_tag(conn: &Connection, tag_id: &str) -> rusqlite::Result<Option<RawTag>> {
  conn
    .query_row(
      &format!("SELECT {TAG_COLUMNS} FROM tag_records WHERE tag_id = ?1"),
      params![tag_id],
      RawTag::from_row,
    )
    .optional()
}

/// Compare-and-set the owner of an unbound tag.
fn bind_row(
  conn: &Connection,
  tag_id: Uuid,
  account_id: Uuid,
  at: DateTime<Utc>,
) -> rusqlite::Result<Outcome<RawTag>> {
  let tag_str = encode_uuid(tag_id);
  let account_str = encode_uuid(account_id);

  let Some(current) = load_tag(conn, &tag_str)? else {
    return Ok(Err(CoreError::TagNotFound(tag_id)));
  };
  if current.account_id.is_some() {
    return Ok(Err(CoreError::AlreadyBound(tag_id)));
  }
  if !account_exists(conn, &account_str)? {
    return Ok(Err(CoreError::AccountNotFound(account_id)));
  }

  let owned = conn
    .query_row(
      "SELECT tag_id FROM tag_records WHERE account_id = ?1",
      params![account_str],
      |row| uuid_column(row, 0),
    )
    .optional()?;
  if let Some(owned) = owned {
    return Ok(Err(CoreError::AccountAlreadyHasTag { account_id, tag_id: owned }));
  }

  let bound_at = encode_dt(at);
  let changed = conn.execute(
    "UPDATE tag_records SET account_id = ?1, bound_at = ?2
     WHERE tag_id = ?3 AND account_id IS NULL",
    params![account_str, bound_at, tag_str],
  )?;
  if changed == 0 {
    return Ok(Err(CoreError::AlreadyBound(tag_id)));
  }

  Ok(Ok(RawTag {
    tag_id:     tag_str,
    account_id: Some(account_str),
    created_at: current.created_at,
    bound_at:   Some(bound_at),
  }))
}

fn upsert_profile_row(
  conn: &Connection,
  account_id: Uuid,
  fields: &ProfileFields,
  at: DateTime<Utc>,
) -> rusqlite::Result<Outcome<()>> {
  let account_str = encode_uuid(account_id);
  if !account_exists(conn, &account_str)? {
    return Ok(Err(CoreError::AccountNotFound(account_id)));
  }

  // Full replace: every editable column comes from `fields`.
  conn.execute(
    &format!(
      "INSERT INTO contact_profiles ({PROFILE_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
       ON CONFLICT(account_id) DO UPDATE SET
         phone       = excluded.phone,
         address     = excluded.address,
         description = excluded.description,
         photo_url   = excluded.photo_url,
         linkedin    = excluded.linkedin,
         whatsapp    = excluded.whatsapp,
         telegram    = excluded.telegram,
         facebook    = excluded.facebook,
         instagram   = excluded.instagram,
         twitter     = excluded.twitter,
         updated_at  = excluded.updated_at"
    ),
    params![
      account_str,
      fields.phone,
      fields.address,
      fields.description,
      fields.photo_url,
      fields.links.linkedin,
      fields.links.whatsapp,
      fields.links.telegram,
      fields.links.facebook,
      fields.links.instagram,
      fields.links.twitter,
      encode_dt(at),
    ],
  )?;
  Ok(Ok(()))
}

/// Body of the signup transaction.
fn signup_rows(
  conn: &Connection,
  account: &Account,
  tag_id: Uuid,
) -> rusqlite::Result<Outcome<RawTag>> {
  match load_tag(conn, &encode_uuid(tag_id))? {
    None => return Ok(Err(CoreError::TagNotFound(tag_id))),
    Some(raw) if raw.account_id.is_some() => {
      return Ok(Err(CoreError::AlreadyBound(tag_id)));
    }
    Some(_) => {}
  }

  if let Err(e) = insert_account_row(conn, account)? {
    return Ok(Err(e));
  }
  let tag = match bind_row(conn, tag_id, account.account_id, account.created_at)? {
    Ok(tag) => tag,
    Err(e) => return Ok(Err(e)),
  };
  let empty = ProfileFields::default();
  if let Err(e) = upsert_profile_row(conn, account.account_id, &empty, account.created_at)? {
    return Ok(Err(e));
  }
  Ok(Ok(tag))
}

fn new_account(input: NewAccount) -> Account {
  Account {
    account_id:    Uuid::new_v4(),
    username:      input.username,
    email:         input.email,
    password_hash: input.password_hash,
    first_name:    input.first_name,
    last_name:     input.last_name,
    role:          input.role,
    created_at:    Utc::now(),
  }
}

// ─── Trait impls ─────────────────────────────────────────────────────────────

impl Store for SqliteStore {
  type Error = Error;
}

impl IdentityStore for SqliteStore {
  async fn insert_account(&self, input: NewAccount) -> Result<Account> {
    let account = new_account(input);
    let row = account.clone();

    let outcome = self
      .conn
      .call(move |conn| Ok(insert_account_row(conn, &row)?))
      .await?;
    outcome?;

    Ok(account)
  }

  async fn get_account(&self, account_id: Uuid) -> Result<Option<Account>> {
    let id_str = encode_uuid(account_id);

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1"),
              params![id_str],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn find_account_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> Result<Option<Account>> {
    let username = username.to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?1"),
              params![username],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn set_role(&self, account_id: Uuid, role: Role) -> Result<Account> {
    let id_str = encode_uuid(account_id);
    let role_str = encode_role(role);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE accounts SET role = ?1 WHERE account_id = ?2",
          params![role_str, id_str],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::AccountNotFound(account_id).into());
    }

    self
      .get_account(account_id)
      .await?
      .ok_or_else(|| CoreError::AccountNotFound(account_id).into())
  }
}

impl TagRegistry for SqliteStore {
  async fn insert_tag(&self, record: TagRecord) -> Result<bool> {
    if record.is_bound() {
      return Err(CoreError::validation("tag", "must be unbound when inserted").into());
    }
    let id_str = encode_uuid(record.tag_id);
    let at_str = encode_dt(record.created_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO tag_records (tag_id, account_id, created_at, bound_at)
           VALUES (?1, NULL, ?2, NULL)
           ON CONFLICT(tag_id) DO NOTHING",
          params![id_str, at_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn get_tag(&self, tag_id: Uuid) -> Result<Option<TagRecord>> {
    let id_str = encode_uuid(tag_id);
    let raw = self
      .conn
      .call(move |conn| Ok(load_tag(conn, &id_str)?))
      .await?;
    raw.map(RawTag::into_tag).transpose()
  }

  async fn bind_tag(&self, tag_id: Uuid, account_id: Uuid) -> Result<TagRecord> {
    let now = Utc::now();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = bind_row(&tx, tag_id, account_id, now)?;
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?;

    outcome?.into_tag()
  }

  async fn list_tags(&self, filter: TagFilter) -> Result<Vec<TagRecord>> {
    let where_clause = match filter {
      TagFilter::All => "",
      TagFilter::Unbound => "WHERE account_id IS NULL",
      TagFilter::Bound => "WHERE account_id IS NOT NULL",
    };

    let raws: Vec<RawTag> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TAG_COLUMNS} FROM tag_records {where_clause}
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawTag::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTag::into_tag).collect()
  }

  async fn tag_for_account(&self, account_id: Uuid) -> Result<Option<TagRecord>> {
    let id_str = encode_uuid(account_id);

    let raw: Option<RawTag> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TAG_COLUMNS} FROM tag_records WHERE account_id = ?1"),
              params![id_str],
              RawTag::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTag::into_tag).transpose()
  }
}

impl ProfileStore for SqliteStore {
  async fn get_profile(&self, account_id: Uuid) -> Result<Option<ContactProfile>> {
    let id_str = encode_uuid(account_id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {PROFILE_COLUMNS} FROM contact_profiles WHERE account_id = ?1"
              ),
              params![id_str],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn upsert_profile(
    &self,
    account_id: Uuid,
    fields: ProfileFields,
  ) -> Result<ContactProfile> {
    let profile = ContactProfile {
      account_id,
      fields: fields.normalized(),
      updated_at: Utc::now(),
    };
    let row = profile.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        Ok(upsert_profile_row(conn, row.account_id, &row.fields, row.updated_at)?)
      })
      .await?;
    outcome?;

    Ok(profile)
  }
}

impl SignupStore for SqliteStore {
  async fn create_account_and_bind(
    &self,
    tag_id: Uuid,
    input: NewAccount,
  ) -> Result<(Account, TagRecord)> {
    let account = new_account(input);
    let row = account.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = signup_rows(&tx, &row, tag_id)?;
        // Dropping `tx` without commit rolls back the account insert.
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?;

    let tag = outcome?.into_tag()?;
    Ok((account, tag))
  }
}
