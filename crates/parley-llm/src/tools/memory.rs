use crate::types::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MEM0_API_BASE: &str = "https://api.mem0.ai";

/// Long-term memory collaborator, keyed by user
#[async_trait]
pub trait MemoryClient: Send + Sync {
    /// Record a conversation fragment for a user
    async fn add(&self, records: Vec<MemoryRecord>, user_id: &str) -> Result<()>;

    /// Return memories relevant to `query` for a user, most relevant first
    async fn search(&self, query: &str, user_id: &str, limit: usize) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordRole {
    User,
    Assistant,
}

/// A `{role, content}` pair as the memory service expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub role: RecordRole,
    pub content: String,
}

impl MemoryRecord {
    /// Human messages become `user` records, AI messages `assistant` records.
    /// System messages and foreign roles are not remembered.
    pub fn from_message(message: &Message) -> Option<Self> {
        let role = match message {
            Message::Human { .. } => RecordRole::User,
            Message::AI { .. } => RecordRole::Assistant,
            Message::System { .. } | Message::Unknown { .. } => return None,
        };
        Some(Self {
            role,
            content: message.content().to_string(),
        })
    }
}

/// HTTP client for the mem0 platform API
pub struct Mem0Client {
    client: Client,
    base_url: String,
}

impl Mem0Client {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, MEM0_API_BASE)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Token {}", api_key.into()))
                .context("Invalid mem0 API key format")?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
struct AddBody<'a> {
    messages: &'a [MemoryRecord],
    user_id: &'a str,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    user_id: &'a str,
    limit: usize,
}

#[derive(Deserialize)]
struct Mem0Memory {
    memory: String,
}

// v1 returns a bare list, newer deployments wrap it in `results`
#[derive(Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    List(Vec<Mem0Memory>),
    Wrapped { results: Vec<Mem0Memory> },
}

#[async_trait]
impl MemoryClient for Mem0Client {
    async fn add(&self, records: Vec<MemoryRecord>, user_id: &str) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(format!("{}/v1/memories/", self.base_url))
            .json(&AddBody {
                messages: &records,
                user_id,
            })
            .send()
            .await
            .context("Failed to send mem0 add request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("mem0 API error ({}): {}", status, error_text);
        }

        tracing::debug!(user_id = %user_id, count = records.len(), "Stored memories");
        Ok(())
    }

    async fn search(&self, query: &str, user_id: &str, limit: usize) -> Result<Vec<String>> {
        let response = self
            .client
            .post(format!("{}/v1/memories/search/", self.base_url))
            .json(&SearchBody {
                query,
                user_id,
                limit,
            })
            .send()
            .await
            .context("Failed to send mem0 search request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("mem0 API error ({}): {}", status, error_text);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to parse mem0 search response")?;

        let memories = match parsed {
            SearchResponse::List(items) | SearchResponse::Wrapped { results: items } => items,
        };

        Ok(memories
            .into_iter()
            .take(limit)
            .map(|m| m.memory)
            .collect())
    }
}
