//! In-memory profile store with a case-insensitive email index.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::ports::{ProfileStore, ProfileStoreError};
use crate::domain::{Profile, UserId};

#[derive(Debug, Default)]
struct ProfileTable {
    by_id: HashMap<UserId, Profile>,
    by_email: HashMap<String, UserId>,
}

/// Profile documents keyed by user id.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    table: RwLock<ProfileTable>,
}

fn email_key(email: &str) -> String {
    email.to_ascii_lowercase()
}

impl InMemoryProfileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored profiles.
    pub async fn len(&self) -> usize {
        self.table.read().await.by_id.len()
    }

    /// Whether no profiles are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn insert(&self, profile: &Profile) -> Result<(), ProfileStoreError> {
        let mut table = self.table.write().await;
        if table.by_id.contains_key(&profile.user_id) {
            return Err(ProfileStoreError::duplicate_key("user_id"));
        }
        let key = email_key(&profile.details.email);
        if table.by_email.contains_key(&key) {
            debug!(user_id = %profile.user_id, "email index rejected insert");
            return Err(ProfileStoreError::duplicate_key("email"));
        }
        table.by_email.insert(key, profile.user_id.clone());
        table
            .by_id
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Profile>, ProfileStoreError> {
        Ok(self.table.read().await.by_id.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, ProfileStoreError> {
        let table = self.table.read().await;
        Ok(table
            .by_email
            .get(&email_key(email))
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn update(&self, profile: &Profile) -> Result<(), ProfileStoreError> {
        let mut table = self.table.write().await;
        let previous_key = match table.by_id.get(&profile.user_id) {
            Some(existing) => email_key(&existing.details.email),
            None => {
                return Err(ProfileStoreError::query(format!(
                    "profile {} does not exist",
                    profile.user_id
                )));
            }
        };
        let key = email_key(&profile.details.email);
        if table
            .by_email
            .get(&key)
            .is_some_and(|owner| owner != &profile.user_id)
        {
            return Err(ProfileStoreError::duplicate_key("email"));
        }
        table.by_email.remove(&previous_key);
        table.by_email.insert(key, profile.user_id.clone());
        table
            .by_id
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}
