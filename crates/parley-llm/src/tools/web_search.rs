use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TAVILY_API_BASE: &str = "https://api.tavily.com";

/// Web search collaborator
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
}

impl SearchResult {
    /// Render results as a plain-text block for a system prompt
    pub fn format_all(results: &[SearchResult]) -> String {
        if results.is_empty() {
            return "No results found".to_string();
        }

        results
            .iter()
            .map(|r| format!("Title: {}\nContent: {}\nURL: {}", r.title, r.content, r.url))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// HTTP client for the Tavily search API
pub struct TavilyClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_results: usize,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, TAVILY_API_BASE)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_results: 3,
        })
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[async_trait]
impl SearchClient for TavilyClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&TavilyRequest {
                api_key: &self.api_key,
                query,
                max_results: self.max_results,
            })
            .send()
            .await
            .context("Failed to send Tavily search request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Tavily API error ({}): {}", status, error_text);
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .context("Failed to parse Tavily response")?;

        Ok(parsed.results)
    }
}
