use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use crate::saver::{Backend, CheckpointSaver};

/// Process-lifetime checkpoint storage.
///
/// Checkpoints are kept as serialized JSON so that a stored snapshot can
/// never alias a value the caller keeps mutating.
#[derive(Debug, Clone, Default)]
pub struct InMemorySaver {
    storage: Arc<RwLock<HashMap<String, StoredCheckpoint>>>,
}

#[derive(Debug, Clone)]
struct StoredCheckpoint {
    payload: Vec<u8>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl InMemorySaver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.storage.read().await.is_empty()
    }
}

#[async_trait]
impl CheckpointSaver for InMemorySaver {
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let storage = self.storage.read().await;
        match storage.get(thread_id) {
            Some(stored) => Ok(Some(serde_json::from_slice(&stored.payload)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, thread_id: &str, checkpoint: &Checkpoint) -> Result<()> {
        let payload = serde_json::to_vec(checkpoint)?;
        self.storage.write().await.insert(
            thread_id.to_string(),
            StoredCheckpoint {
                payload,
                updated_at: checkpoint.updated_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, thread_id: &str) -> Result<bool> {
        Ok(self.storage.write().await.remove(thread_id).is_some())
    }

    async fn list_threads(&self) -> Result<Vec<String>> {
        let storage = self.storage.read().await;
        let mut entries: Vec<_> = storage
            .iter()
            .map(|(id, stored)| (id.clone(), stored.updated_at))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(entries.into_iter().map(|(id, _)| id).collect())
    }

    fn backend(&self) -> Backend {
        Backend::Memory
    }
}
