//! In-memory credential store with a unique username index.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{CredentialStore, CredentialStoreError};
use crate::domain::{Credential, UserId};

#[derive(Debug, Default)]
struct CredentialTable {
    by_id: HashMap<UserId, Credential>,
    by_username: HashMap<String, UserId>,
}

/// Credential documents keyed by user id.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    table: RwLock<CredentialTable>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials.
    pub async fn len(&self) -> usize {
        self.table.read().await.by_id.len()
    }

    /// Whether no credentials are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn insert(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        let mut table = self.table.write().await;
        if table.by_id.contains_key(&credential.user_id) {
            return Err(CredentialStoreError::duplicate_key("user_id"));
        }
        if table.by_username.contains_key(&credential.username) {
            return Err(CredentialStoreError::duplicate_key("username"));
        }
        table
            .by_username
            .insert(credential.username.clone(), credential.user_id.clone());
        table
            .by_id
            .insert(credential.user_id.clone(), credential.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Credential>, CredentialStoreError> {
        Ok(self.table.read().await.by_id.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Credential>, CredentialStoreError> {
        let table = self.table.read().await;
        Ok(table
            .by_username
            .get(username)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn update(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        let mut table = self.table.write().await;
        let previous_username = match table.by_id.get(&credential.user_id) {
            Some(existing) => existing.username.clone(),
            None => {
                return Err(CredentialStoreError::query(format!(
                    "credential {} does not exist",
                    credential.user_id
                )));
            }
        };
        if table
            .by_username
            .get(&credential.username)
            .is_some_and(|owner| owner != &credential.user_id)
        {
            return Err(CredentialStoreError::duplicate_key("username"));
        }
        table.by_username.remove(&previous_username);
        table
            .by_username
            .insert(credential.username.clone(), credential.user_id.clone());
        table
            .by_id
            .insert(credential.user_id.clone(), credential.clone());
        Ok(())
    }
}
