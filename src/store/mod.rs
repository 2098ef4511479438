//! Credential storage
//!
//! The relational user table lives outside this service; everything here
//! talks to it through [`CredentialStore`].

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::Principal;
use crate::types::Result;

pub use memory::MemoryCredentialStore;

/// Stored member credentials and profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: i64,
    /// Login name, unique across the store
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2 PHC hash
    pub password_hash: String,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn to_principal(&self) -> Principal {
        Principal {
            id: self.id,
            username: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            admin: self.admin,
        }
    }
}

/// Insert payload; the store assigns the id and timestamps
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub admin: bool,
}

/// Lookup and maintenance of member credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_login_name(&self, login_name: &str) -> Result<Option<CredentialRecord>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<CredentialRecord>>;

    async fn exists_by_login_name(&self, login_name: &str) -> Result<bool>;

    /// Fails with `StudioError::Conflict` when the login name is taken.
    async fn insert(&self, credential: NewCredential) -> Result<CredentialRecord>;

    /// Returns false when no record had that id.
    async fn delete(&self, id: i64) -> Result<bool>;
}
