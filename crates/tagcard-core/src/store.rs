//! Persistence contracts.
//!
//! The traits are implemented by storage backends (e.g.
//! `tagcard-store-sqlite`). Workflows and the web layer depend on these
//! abstractions, not on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error,
  account::{Account, NewAccount, Role},
  profile::{ContactProfile, ProfileFields},
  tag::{TagFilter, TagRecord},
};

/// Shared error plumbing for every store trait.
///
/// A backend error must be constructible from a domain [`Error`] (so the
/// backend can report `AlreadyBound`, `Duplicate`, …) and convertible back
/// into one without losing the domain variant.
pub trait Store: Send + Sync {
  type Error: std::error::Error
    + Send
    + Sync
    + 'static
    + From<Error>
    + Into<Error>;
}

// ─── Identity ────────────────────────────────────────────────────────────────

pub trait IdentityStore: Store {
  /// Persist a new account. Fails with [`Error::Duplicate`] if the username
  /// or email is taken; the username is checked first.
  fn insert_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  fn get_account(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  fn find_account_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  /// Change an account's role. The only in-place account mutation.
  fn set_role(
    &self,
    account_id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub trait TagRegistry: Store {
  /// Insert an unbound tag. Returns `false`, leaving the existing row alone,
  /// if the id is already taken.
  fn insert_tag(
    &self,
    record: TagRecord,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Retrieve a tag by id. Returns `None` if not found.
  fn get_tag(
    &self,
    tag_id: Uuid,
  ) -> impl Future<Output = Result<Option<TagRecord>, Self::Error>> + Send + '_;

  /// Like [`TagRegistry::get_tag`] but a missing tag is
  /// [`Error::TagNotFound`].
  fn lookup_tag(
    &self,
    tag_id: Uuid,
  ) -> impl Future<Output = Result<TagRecord, Self::Error>> + Send + '_ {
    async move {
      self
        .get_tag(tag_id)
        .await?
        .ok_or_else(|| Error::TagNotFound(tag_id).into())
    }
  }

  /// Bind an unbound tag to `account_id` with a compare-and-set.
  ///
  /// Fails with [`Error::TagNotFound`], [`Error::AlreadyBound`] (including
  /// when a concurrent bind won), [`Error::AccountAlreadyHasTag`] or
  /// [`Error::AccountNotFound`].
  fn bind_tag(
    &self,
    tag_id: Uuid,
    account_id: Uuid,
  ) -> impl Future<Output = Result<TagRecord, Self::Error>> + Send + '_;

  /// List tags, newest first.
  fn list_tags(
    &self,
    filter: TagFilter,
  ) -> impl Future<Output = Result<Vec<TagRecord>, Self::Error>> + Send + '_;

  /// The tag bound to `account_id`, if any.
  fn tag_for_account(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<Option<TagRecord>, Self::Error>> + Send + '_;
}

// ─── Profiles ────────────────────────────────────────────────────────────────

pub trait ProfileStore: Store {
  /// `None` means no profile has been written yet; that is not an error.
  fn get_profile(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<Option<ContactProfile>, Self::Error>> + Send + '_;

  /// Create or fully replace the profile for `account_id`. Every editable
  /// column is written from `fields`; absent fields become NULL.
  fn upsert_profile(
    &self,
    account_id: Uuid,
    fields: ProfileFields,
  ) -> impl Future<Output = Result<ContactProfile, Self::Error>> + Send + '_;
}

// ─── Signup ──────────────────────────────────────────────────────────────────

/// A backend that can run account creation and tag binding as one atomic
/// unit.
pub trait SignupStore: IdentityStore + TagRegistry + ProfileStore {
  /// In a single transaction: re-check that `tag_id` exists and is unbound,
  /// insert the account, bind the tag to it, and seed an empty profile.
  /// On any failure nothing is written.
  fn create_account_and_bind(
    &self,
    tag_id: Uuid,
    input: NewAccount,
  ) -> impl Future<Output = Result<(Account, TagRecord), Self::Error>> + Send + '_;
}
