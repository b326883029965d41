//! HTTP surface for tagcard.
//!
//! Exposes an axum [`Router`] backed by any [`SignupStore`]. Scanning a tag
//! lands on `/tag/{tag_id}`, which redirects either to the signup form or to
//! the owner's contact card.
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | `GET`  | `/tag/{tag_id}` | none |
//! | `GET`  | `/api/tags/{tag_id}` | none |
//! | `GET`/`POST` | `/signup/{tag_id}` | none |
//! | `GET`  | `/contact/{tag_id}` | none |
//! | `GET`  | `/me` | Basic |
//! | `GET`/`PUT` | `/me/profile` | Basic |
//! | `GET`/`POST` | `/admin/tags` | Basic, administrator |

pub mod auth;
pub mod error;
pub mod etag;
pub mod handlers;

pub use error::ApiError;

use std::sync::Arc;

use axum::{Router, routing::get};
use tagcard_core::{
  Accounts, Provisioner, SignupWorkflow, TagResolver, store::SignupStore,
  tag::format_tag_id,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use handlers::{admin, contact, me, scan, signup};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:       Arc<S>,
  pub accounts:    Accounts<S>,
  pub resolver:    TagResolver<S, S>,
  pub signup:      SignupWorkflow<S>,
  pub provisioner: Provisioner<S>,
  /// Public origin printed into scan URLs, without a trailing slash.
  pub base_url:    Arc<str>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:       Arc::clone(&self.store),
      accounts:    self.accounts.clone(),
      resolver:    self.resolver.clone(),
      signup:      self.signup.clone(),
      provisioner: self.provisioner.clone(),
      base_url:    Arc::clone(&self.base_url),
    }
  }
}

impl<S: SignupStore> AppState<S> {
  pub fn new(store: Arc<S>, base_url: &str) -> Self {
    Self {
      accounts:    Accounts::new(store.clone()),
      resolver:    TagResolver::new(store.clone(), store.clone()),
      signup:      SignupWorkflow::new(store.clone()),
      provisioner: Provisioner::new(store.clone()),
      base_url:    base_url.trim_end_matches('/').into(),
      store,
    }
  }

  /// Cap the number of tags one admin request may mint.
  pub fn with_max_batch(mut self, max_batch: u32) -> Self {
    self.provisioner = self.provisioner.with_max_batch(max_batch);
    self
  }

  /// The URL encoded onto the physical tag.
  pub fn scan_url(&self, tag_id: Uuid) -> String {
    format!("{}/tag/{}", self.base_url, format_tag_id(tag_id))
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the whole HTTP surface.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SignupStore + 'static,
{
  Router::new()
    // Scanning
    .route("/tag/{tag_id}", get(scan::redirect::<S>))
    .route("/api/tags/{tag_id}", get(scan::decision::<S>))
    // Claiming
    .route("/signup/{tag_id}", get(signup::form::<S>).post(signup::submit::<S>))
    .route("/contact/{tag_id}", get(contact::card::<S>))
    // Principal
    .route("/me", get(me::whoami::<S>))
    .route("/me/profile", get(me::get_profile::<S>).put(me::put_profile::<S>))
    // Administration
    .route("/admin/tags", get(admin::list::<S>).post(admin::provision::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
