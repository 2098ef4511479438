//! Ownership checks for mutating member operations

use crate::auth::Principal;

/// Whether `current` may mutate a resource owned by `resource_owner_login_name`.
///
/// Only the owner is permitted; admin status grants nothing here.
pub fn permits(current: &Principal, resource_owner_login_name: &str) -> bool {
    current.username == resource_owner_login_name
}
