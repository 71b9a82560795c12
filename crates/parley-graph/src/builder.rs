use anyhow::{anyhow, Result};
use parley_checkpoint::CheckpointerProvider;
use parley_llm::MemoryClient;
use std::sync::Arc;

use crate::agent::Agent;
use crate::graph::Graph;

/// Builder for constructing a Graph with optional components
pub struct GraphBuilder {
    agent: Option<Arc<dyn Agent>>,
    memory: Option<Arc<dyn MemoryClient>>,
    checkpointer: Option<Arc<CheckpointerProvider>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            agent: None,
            memory: None,
            checkpointer: None,
        }
    }

    /// Set the agent run by the agent step
    pub fn agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Enable the memory write step
    pub fn memory(mut self, memory: Arc<dyn MemoryClient>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn checkpointer(mut self, checkpointer: Arc<CheckpointerProvider>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    /// Build the Graph
    pub fn build(self) -> Result<Graph> {
        let agent = self.agent.ok_or_else(|| anyhow!("Agent is required"))?;
        let checkpointer = self
            .checkpointer
            .ok_or_else(|| anyhow!("Checkpointer is required"))?;

        Ok(Graph::new(agent, self.memory, checkpointer))
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
