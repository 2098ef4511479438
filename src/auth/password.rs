//! Member password storage
//!
//! Signup stores an argon2id PHC string; login checks the submitted password
//! against it. Cleartext passwords are never kept or logged.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::types::StudioError;

/// Hash a member's signup password into a PHC string with a fresh salt
pub fn hash_password(password: &str) -> Result<String, StudioError> {
    let salt = SaltString::generate(&mut OsRng);

    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StudioError::Internal(format!("cannot hash member password: {e}")))?;
    Ok(phc.to_string())
}

/// Check a login password against the stored PHC string.
///
/// A mismatch is `Ok(false)`. An error means the stored value is not a usable
/// hash at all.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, StudioError> {
    let stored = PasswordHash::new(stored_hash)
        .map_err(|e| StudioError::Auth(format!("stored password hash is unusable: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &stored)
        .is_ok())
}
