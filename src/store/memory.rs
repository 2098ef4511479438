//! In-memory credential store backed by DashMap

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

use super::{CredentialRecord, CredentialStore, NewCredential};
use crate::types::{Result, StudioError};

/// Credential store kept in process memory.
///
/// Records are keyed by id, with a second map indexing login names so that
/// uniqueness is decided under a single shard lock.
#[derive(Debug)]
pub struct MemoryCredentialStore {
    records: DashMap<i64, CredentialRecord>,
    login_index: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            login_index: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_login_name(&self, login_name: &str) -> Result<Option<CredentialRecord>> {
        let Some(id) = self.login_index.get(login_name).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CredentialRecord>> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn exists_by_login_name(&self, login_name: &str) -> Result<bool> {
        Ok(self.login_index.contains_key(login_name))
    }

    async fn insert(&self, credential: NewCredential) -> Result<CredentialRecord> {
        let slot = match self.login_index.entry(credential.email.clone()) {
            Entry::Occupied(_) => {
                return Err(StudioError::Conflict(format!(
                    "Login name already registered: {}",
                    credential.email
                )))
            }
            Entry::Vacant(slot) => slot,
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();
        let record = CredentialRecord {
            id,
            email: credential.email,
            first_name: credential.first_name,
            last_name: credential.last_name,
            password_hash: credential.password_hash,
            admin: credential.admin,
            created_at: now,
            updated_at: now,
        };

        // Record goes in before the index slot is released
        self.records.insert(id, record.clone());
        slot.insert(id);

        debug!("Stored credentials for member {}", id);
        Ok(record)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.records.remove(&id) {
            Some((_, record)) => {
                self.login_index.remove(&record.email);
                debug!("Removed credentials for member {}", id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_credential(email: &str) -> NewCredential {
        NewCredential {
            email: email.into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            password_hash: "$argon2id$placeholder".into(),
            admin: false,
        }
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let store = MemoryCredentialStore::new();

        let first = tokio_test::block_on(store.insert(new_credential("a@studio.com"))).unwrap();
        let second = tokio_test::block_on(store.insert(new_credential("b@studio.com"))).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_by_login_name_and_id() {
        let store = MemoryCredentialStore::new();
        let stored = store.insert(new_credential("a@studio.com")).await.unwrap();

        let by_login = store.find_by_login_name("a@studio.com").await.unwrap();
        assert_eq!(by_login.as_ref(), Some(&stored));

        let by_id = store.find_by_id(stored.id).await.unwrap();
        assert_eq!(by_id, Some(stored));

        assert!(store.find_by_login_name("nobody@studio.com").await.unwrap().is_none());
        assert!(store.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_login_name_is_rejected() {
        let store = MemoryCredentialStore::new();
        store.insert(new_credential("a@studio.com")).await.unwrap();

        let err = store.insert(new_credential("a@studio.com")).await.unwrap_err();
        assert!(matches!(err, StudioError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_frees_login_name() {
        let store = MemoryCredentialStore::new();
        let stored = store.insert(new_credential("a@studio.com")).await.unwrap();

        assert!(store.delete(stored.id).await.unwrap());
        assert!(!store.delete(stored.id).await.unwrap());
        assert!(!store.exists_by_login_name("a@studio.com").await.unwrap());
        assert!(store.is_empty());

        let again = store.insert(new_credential("a@studio.com")).await.unwrap();
        assert_ne!(again.id, stored.id);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_keep_login_names_unique() {
        let store = std::sync::Arc::new(MemoryCredentialStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move { store.insert(new_credential("same@studio.com")).await })
            })
            .collect();

        let mut stored = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                stored += 1;
            }
        }

        assert_eq!(stored, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_record_converts_to_principal() {
        let store = MemoryCredentialStore::new();
        let mut credential = new_credential("yoga@studio.com");
        credential.admin = true;
        let record = tokio_test::block_on(store.insert(credential)).unwrap();

        let principal = record.to_principal();
        assert_eq!(principal.id, record.id);
        assert_eq!(principal.username, "yoga@studio.com");
        assert!(principal.admin);
    }
}
