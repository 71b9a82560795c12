use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use parley_llm::{
    ChatClient, ChatOptions, ChatRequest, MemoryClient, Message, SearchClient, SearchResult,
};
use std::sync::Arc;

use crate::agent::Agent;
use crate::outcome::best_effort;
use crate::types::{LLMConfig, RunConfig};

/// Default agent: gathers context from its helpers, then asks the model.
///
/// Helpers are the long-term memory (relevant facts about the user) and web
/// search. Either may be absent or fail; the model is still called.
pub struct SupervisorAgent {
    chat: Arc<dyn ChatClient>,
    memory: Option<Arc<dyn MemoryClient>>,
    search: Option<Arc<dyn SearchClient>>,
    config: LLMConfig,
    memory_limit: usize,
}

impl SupervisorAgent {
    pub fn new(chat: Arc<dyn ChatClient>, config: LLMConfig) -> Self {
        Self {
            chat,
            memory: None,
            search: None,
            config,
            memory_limit: 5,
        }
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryClient>, limit: usize) -> Self {
        self.memory = Some(memory);
        self.memory_limit = limit;
        self
    }

    pub fn with_search(mut self, search: Arc<dyn SearchClient>) -> Self {
        self.search = Some(search);
        self
    }

    async fn recall(&self, query: &str, user_id: &str) -> Option<String> {
        let memory = self.memory.as_ref()?;
        let found = best_effort(
            "memory_search",
            memory.search(query, user_id, self.memory_limit),
            Vec::new,
        )
        .await
        .into_inner();

        if found.is_empty() {
            return None;
        }

        let lines: Vec<String> = found.iter().map(|m| format!("- {m}")).collect();
        Some(format!("Relevant memories about the user:\n{}", lines.join("\n")))
    }

    async fn research(&self, query: &str) -> Option<String> {
        let search = self.search.as_ref()?;
        let results = best_effort("web_search", search.search(query), Vec::new)
            .await
            .into_inner();

        if results.is_empty() {
            return None;
        }

        Some(format!(
            "Web search results:\n{}",
            SearchResult::format_all(&results)
        ))
    }

    fn system_prompt(&self, context: &[String]) -> String {
        let mut prompt = self.config.system_prompt.clone();
        for section in context {
            prompt.push_str("\n\n");
            prompt.push_str(section);
        }
        prompt
    }
}

#[async_trait]
impl Agent for SupervisorAgent {
    async fn run(&self, messages: Vec<Message>, run: &RunConfig) -> Result<Vec<Message>> {
        let query = messages
            .iter()
            .rev()
            .find(|m| m.is_human())
            .map(|m| m.content().to_string())
            .unwrap_or_default();

        let (memories, research) = if query.is_empty() {
            (None, None)
        } else {
            tokio::join!(self.recall(&query, &run.user_id), self.research(&query))
        };
        let context: Vec<String> = memories.into_iter().chain(research).collect();

        let mut request_messages = Vec::with_capacity(messages.len() + 1);
        request_messages.push(Message::system(self.system_prompt(&context)));
        request_messages.extend(
            messages
                .iter()
                .filter(|m| !matches!(m, Message::System { .. }))
                .cloned(),
        );

        let mut options = ChatOptions::new().user(run.user_id.clone());
        options.temperature = self.config.temperature;
        options.max_tokens = self.config.max_tokens;

        let response = self
            .chat
            .chat(ChatRequest::new(self.config.model.clone(), request_messages).with_options(options))
            .await
            .context("Supervisor model call failed")?;

        let content = response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("Model returned an empty completion"))?;

        let usage = response.usage.as_ref();
        tracing::debug!(
            context_sections = context.len(),
            input_tokens = usage.map(|u| u.input_tokens),
            output_tokens = usage.map(|u| u.output_tokens),
            finish_reason = ?response.finish_reason,
            "Supervisor completed"
        );

        let mut output = messages;
        output.push(Message::ai(content));
        Ok(output)
    }
}
