use anyhow::Result;
use async_trait::async_trait;
use parley_llm::{MemoryClient, MemoryRecord};
use std::sync::Arc;

use crate::node::{Node, NodeType};
use crate::outcome::best_effort;
use crate::types::GraphState;

/// Hands the conversation to long-term memory.
///
/// Never fails the run: a memory outage is recorded on the state and logged.
pub struct MemoryNode {
    memory: Option<Arc<dyn MemoryClient>>,
}

impl MemoryNode {
    pub fn new(memory: Option<Arc<dyn MemoryClient>>) -> Self {
        Self { memory }
    }
}

#[async_trait]
impl Node for MemoryNode {
    async fn execute(&self, state: &mut GraphState) -> Result<()> {
        let Some(memory) = &self.memory else {
            return Ok(());
        };

        let records: Vec<MemoryRecord> = state
            .messages
            .iter()
            .filter_map(MemoryRecord::from_message)
            .collect();

        let outcome = best_effort(
            "memory_write",
            memory.add(records, &state.user_id),
            || (),
        )
        .await;

        if let Some(reason) = outcome.reason() {
            state.record_degradation(reason);
        }

        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::Memory
    }
}
