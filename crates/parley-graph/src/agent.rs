use anyhow::Result;
use async_trait::async_trait;
use parley_llm::Message;

use crate::types::RunConfig;

/// The model-invocation collaborator.
///
/// Takes the whole conversation and returns it with one new assistant
/// message appended, or fails.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(&self, messages: Vec<Message>, run: &RunConfig) -> Result<Vec<Message>>;
}
