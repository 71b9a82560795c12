use crate::dbs::sqlite::SqlitePersistenceClient;
use crate::error::{PersistError, Result};

pub struct PersistClientBuilder {
    database_url: Option<String>,
    max_connections: u32,
}

impl PersistClientBuilder {
    pub fn new() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
        }
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Connect and make sure the registry schema exists
    pub async fn build(self) -> Result<SqlitePersistenceClient> {
        let database_url = self
            .database_url
            .ok_or_else(|| PersistError::Internal("database_url is required".to_string()))?;

        let client = SqlitePersistenceClient::connect(&database_url, self.max_connections).await?;
        client.init_schema().await?;

        tracing::info!(max_connections = self.max_connections, "Registry connected");
        Ok(client)
    }
}

impl Default for PersistClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
