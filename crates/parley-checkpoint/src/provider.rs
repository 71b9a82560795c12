use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::{CheckpointError, Result};
use crate::memory::InMemorySaver;
use crate::saver::{Backend, CheckpointSaver};
use crate::sqlite::SqliteSaver;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointerKind {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Default)]
pub struct CheckpointerConfig {
    pub kind: CheckpointerKind,
    pub database_url: Option<String>,
}

impl CheckpointerConfig {
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn sqlite(database_url: impl Into<String>) -> Self {
        Self {
            kind: CheckpointerKind::Sqlite,
            database_url: Some(database_url.into()),
        }
    }
}

/// Owns the process's single checkpoint saver.
///
/// The saver is built on first `get()`; concurrent first callers wait on
/// the same initialization and all receive the same instance. If the durable
/// backend cannot be opened the provider serves an in-memory saver instead.
pub struct CheckpointerProvider {
    config: CheckpointerConfig,
    saver: OnceCell<Arc<dyn CheckpointSaver>>,
}

impl CheckpointerProvider {
    /// Validate configuration without touching the database.
    ///
    /// A durable backend with no connection string is a configuration error.
    pub fn new(config: CheckpointerConfig) -> Result<Self> {
        if config.kind == CheckpointerKind::Sqlite {
            let has_url = config
                .database_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty());
            if !has_url {
                return Err(CheckpointError::Config(
                    "database_url is required for the sqlite checkpointer".to_string(),
                ));
            }
        }

        Ok(Self {
            config,
            saver: OnceCell::new(),
        })
    }

    /// Provider that already holds `saver`
    pub fn from_saver(saver: Arc<dyn CheckpointSaver>) -> Self {
        let config = CheckpointerConfig {
            kind: match saver.backend() {
                Backend::Memory => CheckpointerKind::Memory,
                Backend::Sqlite => CheckpointerKind::Sqlite,
            },
            database_url: None,
        };

        Self {
            config,
            saver: OnceCell::new_with(Some(saver)),
        }
    }

    /// The shared saver, initializing it on first use
    pub async fn get(&self) -> Arc<dyn CheckpointSaver> {
        self.saver
            .get_or_init(|| self.initialize())
            .await
            .clone()
    }

    /// Backend actually serving requests (may differ from the configured one)
    pub async fn backend(&self) -> Backend {
        self.get().await.backend()
    }

    pub fn configured_kind(&self) -> CheckpointerKind {
        self.config.kind
    }

    pub fn is_initialized(&self) -> bool {
        self.saver.initialized()
    }

    async fn initialize(&self) -> Arc<dyn CheckpointSaver> {
        let url = match (self.config.kind, self.config.database_url.as_deref()) {
            (CheckpointerKind::Sqlite, Some(url)) => url,
            _ => {
                tracing::info!(backend = "memory", "Checkpointer initialized");
                return Arc::new(InMemorySaver::new());
            }
        };

        match SqliteSaver::connect(url).await {
            Ok(saver) => {
                tracing::info!(backend = "sqlite", "Checkpointer initialized");
                Arc::new(saver)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Durable checkpointer failed to initialize, falling back to in-memory"
                );
                Arc::new(InMemorySaver::new())
            }
        }
    }
}
