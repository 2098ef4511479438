//! Credential verification for login

use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::{verify_password, Principal};
use crate::store::CredentialStore;
use crate::types::StudioError;

const BAD_CREDENTIALS: &str = "Bad credentials";

/// Checks a submitted password against the stored Argon2 hash
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Verify credentials and return the member they belong to.
    ///
    /// Unknown login names and wrong passwords fail identically with
    /// `StudioError::Auth`. Store failures are passed through unchanged.
    pub async fn authenticate(
        &self,
        login_name: &str,
        password: &str,
    ) -> Result<Principal, StudioError> {
        let Some(record) = self.store.find_by_login_name(login_name).await? else {
            debug!("Authentication failed - unknown login name: {}", login_name);
            return Err(StudioError::Auth(BAD_CREDENTIALS.into()));
        };

        let matches = match verify_password(password, &record.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Stored hash for member {} is unusable: {}", record.id, e);
                false
            }
        };

        if !matches {
            debug!("Authentication failed - password mismatch: {}", login_name);
            return Err(StudioError::Auth(BAD_CREDENTIALS.into()));
        }

        Ok(record.to_principal())
    }
}
