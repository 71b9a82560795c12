use parley_checkpoint::Checkpoint;
use parley_llm::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::RunConfig;

/// Input to one pipeline run: the full conversation so far, ending with the
/// new user message
#[derive(Debug, Clone)]
pub struct GraphInput {
    pub messages: Vec<Message>,
}

impl GraphInput {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphState {
    pub thread_id: String,
    pub user_id: String,
    pub run_id: String,
    pub messages: Vec<Message>,
    /// Auxiliary channels, stored alongside messages in the checkpoint
    pub variables: Map<String, Value>,
    /// Steps whose failure was absorbed during this run
    #[serde(default)]
    pub degradations: Vec<String>,
}

impl GraphState {
    pub fn from_input(input: GraphInput, run: RunConfig) -> Self {
        Self {
            thread_id: run.thread_id,
            user_id: run.user_id,
            run_id: uuid::Uuid::new_v4().to_string(),
            messages: input.messages,
            variables: Map::new(),
            degradations: Vec::new(),
        }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(self.thread_id.clone(), self.user_id.clone())
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn record_degradation(&mut self, reason: impl Into<String>) {
        self.degradations.push(reason.into());
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    /// Snapshot for the checkpoint store
    pub fn to_checkpoint(&self) -> Checkpoint {
        let mut checkpoint =
            Checkpoint::new(self.messages.clone()).with_run_id(self.run_id.clone());
        checkpoint.channel_values = self.variables.clone();
        checkpoint
    }
}
