use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::checkpoint::Checkpoint;
use crate::error::Result;

/// Which storage actually serves checkpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    Sqlite,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for checkpoint storage
///
/// Keyed by thread token. A token with no checkpoint yields `Ok(None)`,
/// never an error.
#[async_trait]
pub trait CheckpointSaver: Send + Sync {
    /// Load the current checkpoint for a thread
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// Replace the current checkpoint for a thread
    async fn put(&self, thread_id: &str, checkpoint: &Checkpoint) -> Result<()>;

    /// Remove a thread's checkpoint, returning whether one existed
    async fn delete(&self, thread_id: &str) -> Result<bool>;

    /// Tokens that currently hold a checkpoint, most recently written first
    async fn list_threads(&self) -> Result<Vec<String>>;

    fn backend(&self) -> Backend;
}
