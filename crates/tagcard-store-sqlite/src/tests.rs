//! Integration tests for `SqliteStore` and the core workflows running on top
//! of it, against an in-memory database.

use std::sync::Arc;

use tagcard_core::{
  Accounts, DuplicateField, Error as CoreError, Provisioner, SignupWorkflow,
  TagResolver,
  account::{AccountInput, NewAccount, Role},
  profile::{ProfileFields, ProfileLinks},
  provision::MAX_PROVISION_ATTEMPTS,
  store::{IdentityStore, ProfileStore, SignupStore, TagRegistry},
  tag::{RoutingDecision, TagFilter, TagRecord},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> Arc<SqliteStore> {
  Arc::new(
    SqliteStore::open_in_memory()
      .await
      .expect("in-memory store"),
  )
}

fn new_account(username: &str) -> NewAccount {
  NewAccount {
    username:      username.into(),
    email:         format!("{username}@example.com"),
    password_hash: "$argon2id$not-a-real-hash".into(),
    first_name:    None,
    last_name:     None,
    role:          Role::Standard,
  }
}

fn core(e: Error) -> CoreError { e.into() }

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_account() {
  let s = store().await;
  let account = s.insert_account(new_account("alice")).await.unwrap();

  let fetched = s.get_account(account.account_id).await.unwrap().unwrap();
  assert_eq!(fetched.username, "alice");
  assert_eq!(fetched.email, "alice@example.com");
  assert_eq!(fetched.role, Role::Standard);

  let by_name = s.find_account_by_username("alice").await.unwrap().unwrap();
  assert_eq!(by_name.account_id, account.account_id);
}

#[tokio::test]
async fn get_account_missing_returns_none() {
  let s = store().await;
  assert!(s.get_account(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.find_account_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
  let s = store().await;
  s.insert_account(new_account("alice")).await.unwrap();

  let mut again = new_account("alice");
  again.email = "new@x.com".into();
  let err = core(s.insert_account(again).await.unwrap_err());
  assert!(matches!(
    err,
    CoreError::Duplicate { field: DuplicateField::Username }
  ));
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
  let s = store().await;
  s.insert_account(new_account("alice")).await.unwrap();

  let mut other = new_account("alicia");
  other.email = "ALICE@example.com".into();
  let err = core(s.insert_account(other).await.unwrap_err());
  assert!(matches!(err, CoreError::Duplicate { field: DuplicateField::Email }));
}

#[tokio::test]
async fn set_role_promotes_account() {
  let s = store().await;
  let account = s.insert_account(new_account("alice")).await.unwrap();

  let promoted = s
    .set_role(account.account_id, Role::Administrator)
    .await
    .unwrap();
  assert!(promoted.is_administrator());

  let err = core(s.set_role(Uuid::new_v4(), Role::Administrator).await.unwrap_err());
  assert!(matches!(err, CoreError::AccountNotFound(_)));
}

// ─── Identity service ────────────────────────────────────────────────────────

#[tokio::test]
async fn create_account_duplicate_username_fails() {
  let s = store().await;
  let accounts = Accounts::new(s.clone());
  accounts
    .create_account(AccountInput::new("alice", "a@x.com", "pw"), Role::Standard)
    .await
    .unwrap();

  let err = accounts
    .create_account(AccountInput::new("alice", "new@x.com", "pw"), Role::Standard)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    CoreError::Duplicate { field: DuplicateField::Username }
  ));
}

#[tokio::test]
async fn verify_credentials_does_not_distinguish_failures() {
  let s = store().await;
  let accounts = Accounts::new(s.clone());
  let created = accounts
    .create_account(AccountInput::new("alice", "a@x.com", "pw"), Role::Standard)
    .await
    .unwrap();

  let ok = accounts.verify_credentials("alice", "pw").await.unwrap();
  assert_eq!(ok.account_id, created.account_id);

  let wrong_password = accounts.verify_credentials("alice", "nope").await;
  let unknown_user = accounts.verify_credentials("mallory", "pw").await;
  assert!(matches!(wrong_password, Err(CoreError::InvalidCredentials)));
  assert!(matches!(unknown_user, Err(CoreError::InvalidCredentials)));
}

#[tokio::test]
async fn grant_administrator_changes_role() {
  let s = store().await;
  let accounts = Accounts::new(s.clone());
  accounts
    .create_account(AccountInput::new("root", "r@x.com", "pw"), Role::Standard)
    .await
    .unwrap();

  let principal = accounts.authenticate("root", "pw").await.unwrap();
  assert!(principal.require_administrator().is_err());

  accounts.grant_administrator("root").await.unwrap();
  let principal = accounts.authenticate("root", "pw").await.unwrap();
  assert!(principal.require_administrator().is_ok());
}

// ─── Tags ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn provisioned_tags_look_up_unbound() {
  let s = store().await;
  let provisioner = Provisioner::new(s.clone());

  for _ in 0..5 {
    let tag = provisioner.provision_tag().await.unwrap();
    let found = s.lookup_tag(tag.tag_id).await.unwrap();
    assert_eq!(found.tag_id, tag.tag_id);
    assert!(found.account_id.is_none());
    assert!(found.bound_at.is_none());
  }
}

#[tokio::test]
async fn lookup_unknown_tag_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = core(s.lookup_tag(id).await.unwrap_err());
  assert!(matches!(err, CoreError::TagNotFound(t) if t == id));
}

#[tokio::test]
async fn insert_tag_reports_collisions() {
  let s = store().await;
  let id = Uuid::new_v4();
  assert!(s.insert_tag(TagRecord::unbound(id)).await.unwrap());
  assert!(!s.insert_tag(TagRecord::unbound(id)).await.unwrap());
}

#[tokio::test]
async fn provisioning_gives_up_after_repeated_collisions() {
  let s = store().await;
  let provisioner = Provisioner::new(s.clone());
  let taken = Uuid::new_v4();
  s.insert_tag(TagRecord::unbound(taken)).await.unwrap();

  let mut calls = 0;
  let err = provisioner
    .provision_tag_with(|| {
      calls += 1;
      taken
    })
    .await
    .unwrap_err();

  assert!(matches!(err, CoreError::Exhausted { attempts } if attempts == MAX_PROVISION_ATTEMPTS));
  assert_eq!(calls, MAX_PROVISION_ATTEMPTS);
}

#[tokio::test]
async fn provisioning_retries_past_a_collision() {
  let s = store().await;
  let provisioner = Provisioner::new(s.clone());
  let taken = Uuid::new_v4();
  let fresh = Uuid::new_v4();
  s.insert_tag(TagRecord::unbound(taken)).await.unwrap();

  let mut ids = vec![fresh, taken];
  let tag = provisioner
    .provision_tag_with(|| ids.pop().unwrap())
    .await
    .unwrap();
  assert_eq!(tag.tag_id, fresh);
}

#[tokio::test]
async fn bulk_provisioning_respects_batch_limit() {
  let s = store().await;
  let provisioner = Provisioner::new(s.clone()).with_max_batch(3);

  let minted = provisioner.provision_tags(3).await.unwrap();
  assert_eq!(minted.len(), 3);
  assert!(matches!(
    provisioner.provision_tags(4).await,
    Err(CoreError::Validation { field: "count", .. })
  ));
  assert!(provisioner.provision_tags(0).await.is_err());

  assert_eq!(s.list_tags(TagFilter::All).await.unwrap().len(), 3);
}

#[tokio::test]
async fn bind_tag_sets_owner_once() {
  let s = store().await;
  let tag = Provisioner::new(s.clone()).provision_tag().await.unwrap();
  let alice = s.insert_account(new_account("alice")).await.unwrap();
  let bob = s.insert_account(new_account("bob")).await.unwrap();

  let bound = s.bind_tag(tag.tag_id, alice.account_id).await.unwrap();
  assert_eq!(bound.account_id, Some(alice.account_id));
  assert!(bound.bound_at.is_some());

  let err = core(s.bind_tag(tag.tag_id, bob.account_id).await.unwrap_err());
  assert!(matches!(err, CoreError::AlreadyBound(_)));

  let after = s.lookup_tag(tag.tag_id).await.unwrap();
  assert_eq!(after.account_id, Some(alice.account_id));
}

#[tokio::test]
async fn account_can_own_only_one_tag() {
  let s = store().await;
  let provisioner = Provisioner::new(s.clone());
  let first = provisioner.provision_tag().await.unwrap();
  let second = provisioner.provision_tag().await.unwrap();
  let alice = s.insert_account(new_account("alice")).await.unwrap();

  s.bind_tag(first.tag_id, alice.account_id).await.unwrap();
  let err = core(s.bind_tag(second.tag_id, alice.account_id).await.unwrap_err());
  assert!(matches!(
    err,
    CoreError::AccountAlreadyHasTag { account_id, tag_id }
      if account_id == alice.account_id && tag_id == first.tag_id
  ));

  let bound = s.list_tags(TagFilter::Bound).await.unwrap();
  assert_eq!(bound.len(), 1);
  let owned = s.tag_for_account(alice.account_id).await.unwrap().unwrap();
  assert_eq!(owned.tag_id, first.tag_id);
}

#[tokio::test]
async fn bind_tag_errors() {
  let s = store().await;
  let tag = Provisioner::new(s.clone()).provision_tag().await.unwrap();
  let alice = s.insert_account(new_account("alice")).await.unwrap();

  let err = core(s.bind_tag(Uuid::new_v4(), alice.account_id).await.unwrap_err());
  assert!(matches!(err, CoreError::TagNotFound(_)));

  let err = core(s.bind_tag(tag.tag_id, Uuid::new_v4()).await.unwrap_err());
  assert!(matches!(err, CoreError::AccountNotFound(_)));

  assert!(s.lookup_tag(tag.tag_id).await.unwrap().account_id.is_none());
}

#[tokio::test]
async fn concurrent_binds_have_exactly_one_winner() {
  let s = store().await;
  let tag = Provisioner::new(s.clone()).provision_tag().await.unwrap();
  let alice = s.insert_account(new_account("alice")).await.unwrap();
  let bob = s.insert_account(new_account("bob")).await.unwrap();

  let (a, b) = tokio::join!(
    s.bind_tag(tag.tag_id, alice.account_id),
    s.bind_tag(tag.tag_id, bob.account_id),
  );

  let (winner, loser) = match (a, b) {
    (Ok(w), Err(l)) | (Err(l), Ok(w)) => (w, l),
    other => panic!("expected exactly one winner, got {other:?}"),
  };
  assert!(matches!(core(loser), CoreError::AlreadyBound(_)));

  let stored = s.lookup_tag(tag.tag_id).await.unwrap();
  assert_eq!(stored.account_id, winner.account_id);
}

#[tokio::test]
async fn list_tags_filters_by_status() {
  let s = store().await;
  let provisioner = Provisioner::new(s.clone());
  let a = provisioner.provision_tag().await.unwrap();
  let b = provisioner.provision_tag().await.unwrap();
  let alice = s.insert_account(new_account("alice")).await.unwrap();
  s.bind_tag(a.tag_id, alice.account_id).await.unwrap();

  let all = s.list_tags(TagFilter::All).await.unwrap();
  assert_eq!(all.len(), 2);
  // Newest first.
  assert_eq!(all[0].tag_id, b.tag_id);

  let unbound = s.list_tags(TagFilter::Unbound).await.unwrap();
  assert_eq!(unbound.len(), 1);
  assert_eq!(unbound[0].tag_id, b.tag_id);

  let bound = s.list_tags(TagFilter::Bound).await.unwrap();
  assert_eq!(bound.len(), 1);
  assert_eq!(bound[0].tag_id, a.tag_id);
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_missing_is_none() {
  let s = store().await;
  let alice = s.insert_account(new_account("alice")).await.unwrap();
  assert!(s.get_profile(alice.account_id).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_profile_replaces_every_field() {
  let s = store().await;
  let alice = s.insert_account(new_account("alice")).await.unwrap();

  let first = ProfileFields {
    phone: Some("555-1".into()),
    links: ProfileLinks { linkedin: Some("https://linkedin.com/in/alice".into()), ..Default::default() },
    ..Default::default()
  };
  s.upsert_profile(alice.account_id, first).await.unwrap();

  let second = ProfileFields { address: Some("1 Rd".into()), ..Default::default() };
  s.upsert_profile(alice.account_id, second).await.unwrap();

  let profile = s.get_profile(alice.account_id).await.unwrap().unwrap();
  assert_eq!(profile.fields.address.as_deref(), Some("1 Rd"));
  // Fields omitted from the second write are cleared, not kept.
  assert_eq!(profile.fields.phone, None);
  assert_eq!(profile.fields.links.linkedin, None);
}

#[tokio::test]
async fn upsert_profile_normalises_blank_fields() {
  let s = store().await;
  let alice = s.insert_account(new_account("alice")).await.unwrap();

  let fields = ProfileFields {
    phone: Some("  ".into()),
    description: Some(" hi ".into()),
    ..Default::default()
  };
  let saved = s.upsert_profile(alice.account_id, fields).await.unwrap();
  assert_eq!(saved.fields.phone, None);
  assert_eq!(saved.fields.description.as_deref(), Some("hi"));

  let stored = s.get_profile(alice.account_id).await.unwrap().unwrap();
  assert_eq!(stored.fields, saved.fields);
}

#[tokio::test]
async fn upsert_profile_for_unknown_account_fails() {
  let s = store().await;
  let err = core(
    s.upsert_profile(Uuid::new_v4(), ProfileFields::default())
      .await
      .unwrap_err(),
  );
  assert!(matches!(err, CoreError::AccountNotFound(_)));
}

// ─── Resolution and signup ───────────────────────────────────────────────────

#[tokio::test]
async fn resolve_unknown_tag_is_invalid() {
  let s = store().await;
  let resolver = TagResolver::new(s.clone(), s.clone());

  let decision = resolver.resolve(Uuid::new_v4()).await.unwrap();
  assert!(matches!(decision, RoutingDecision::Invalid));

  let decision = resolver.resolve_str("definitely-not-a-tag").await.unwrap();
  assert!(matches!(decision, RoutingDecision::Invalid));
}

#[tokio::test]
async fn scan_signup_scan_scenario() {
  let s = store().await;
  let resolver = TagResolver::new(s.clone(), s.clone());
  let signup = SignupWorkflow::new(s.clone());
  let t1 = Provisioner::new(s.clone()).provision_tag().await.unwrap();

  let decision = resolver.resolve(t1.tag_id).await.unwrap();
  assert!(matches!(decision, RoutingDecision::NeedsSignup { tag_id } if tag_id == t1.tag_id));

  let alice = signup
    .signup_and_bind(t1.tag_id, AccountInput::new("alice", "a@x.com", "pw"))
    .await
    .unwrap();
  assert_eq!(alice.username, "alice");

  // Resolution is idempotent once bound.
  for _ in 0..3 {
    match resolver.resolve(t1.tag_id).await.unwrap() {
      RoutingDecision::ShowContact { account } => {
        assert_eq!(account.account_id, alice.account_id);
        assert_eq!(account.username, "alice");
      }
      other => panic!("expected ShowContact, got {other:?}"),
    }
  }

  // Signup seeds an empty profile.
  let profile = s.get_profile(alice.account_id).await.unwrap().unwrap();
  assert!(profile.fields.is_empty());
}

#[tokio::test]
async fn signup_on_bound_tag_creates_no_account() {
  let s = store().await;
  let signup = SignupWorkflow::new(s.clone());
  let t1 = Provisioner::new(s.clone()).provision_tag().await.unwrap();

  signup
    .signup_and_bind(t1.tag_id, AccountInput::new("alice", "a@x.com", "pw"))
    .await
    .unwrap();

  let err = signup
    .signup_and_bind(t1.tag_id, AccountInput::new("bob", "b@x.com", "pw"))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::AlreadyBound(t) if t == t1.tag_id));
  assert!(s.find_account_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn signup_on_unknown_tag_fails() {
  let s = store().await;
  let signup = SignupWorkflow::new(s.clone());

  let err = signup
    .signup_and_bind(Uuid::new_v4(), AccountInput::new("bob", "b@x.com", "pw"))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::TagNotFound(_)));
  assert!(s.find_account_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn signup_with_taken_username_leaves_tag_unbound() {
  let s = store().await;
  let signup = SignupWorkflow::new(s.clone());
  let provisioner = Provisioner::new(s.clone());
  let t1 = provisioner.provision_tag().await.unwrap();
  let t2 = provisioner.provision_tag().await.unwrap();

  signup
    .signup_and_bind(t1.tag_id, AccountInput::new("alice", "a@x.com", "pw"))
    .await
    .unwrap();

  let err = signup
    .signup_and_bind(t2.tag_id, AccountInput::new("alice", "other@x.com", "pw"))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    CoreError::Duplicate { field: DuplicateField::Username }
  ));
  assert!(s.lookup_tag(t2.tag_id).await.unwrap().account_id.is_none());
}

#[tokio::test]
async fn failed_bind_inside_signup_rolls_back_account() {
  let s = store().await;
  let t1 = Provisioner::new(s.clone()).provision_tag().await.unwrap();
  s.create_account_and_bind(t1.tag_id, new_account("alice"))
    .await
    .unwrap();

  // Store-level call, skipping the workflow's pre-check: the transaction
  // itself must refuse and leave no "bob" behind.
  let err = core(
    s.create_account_and_bind(t1.tag_id, new_account("bob"))
      .await
      .unwrap_err(),
  );
  assert!(matches!(err, CoreError::AlreadyBound(_)));
  assert!(s.find_account_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_signups_on_same_tag_have_one_winner() {
  let s = store().await;
  let t1 = Provisioner::new(s.clone()).provision_tag().await.unwrap();

  let (a, b) = tokio::join!(
    s.create_account_and_bind(t1.tag_id, new_account("alice")),
    s.create_account_and_bind(t1.tag_id, new_account("bob")),
  );
  assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);

  let alice = s.find_account_by_username("alice").await.unwrap();
  let bob = s.find_account_by_username("bob").await.unwrap();
  assert_eq!(alice.is_some() as u8 + bob.is_some() as u8, 1);
}
