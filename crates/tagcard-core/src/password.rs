//! Password hashing via argon2id (PHC strings).

use std::sync::OnceLock;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;

use crate::{Error, Result};

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// Check `password` against a stored PHC string. A malformed hash counts as a
/// mismatch.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// Burn one verification against a fixed hash so an unknown username costs
/// about as much as a wrong password.
pub fn verify_against_dummy(password: &str) {
  static DUMMY: OnceLock<Option<String>> = OnceLock::new();
  if let Some(phc) = DUMMY.get_or_init(|| hash_password("tagcard-dummy").ok()) {
    let _ = verify_password(password, phc);
  }
}
