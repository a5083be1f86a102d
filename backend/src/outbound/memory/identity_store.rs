//! In-memory identity linking records.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{IdentityStore, IdentityStoreError};
use crate::domain::{IdentityRecord, UserId};

/// Linking records keyed by identity id.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    records: RwLock<HashMap<UserId, IdentityRecord>>,
}

impl InMemoryIdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored linking records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no linking records are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn insert(&self, record: &IdentityRecord) -> Result<(), IdentityStoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(IdentityStoreError::duplicate_key("id"));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<IdentityRecord>, IdentityStoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }
}
