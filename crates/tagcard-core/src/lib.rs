//! Core types, store contracts, and workflows for tagcard.
//!
//! A tag is minted unbound, claimed exactly once by signing up through it,
//! and from then on resolves to its owner's contact card. This crate holds
//! that state machine and the invariants around it. It has no HTTP or
//! database dependencies.

// Backends implement the store traits with plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod error;
pub mod identity;
pub mod password;
pub mod profile;
pub mod provision;
pub mod resolve;
pub mod signup;
pub mod store;
pub mod tag;

pub use error::{DuplicateField, Error, Result};
pub use identity::{Accounts, Principal};
pub use provision::Provisioner;
pub use resolve::TagResolver;
pub use signup::SignupWorkflow;
