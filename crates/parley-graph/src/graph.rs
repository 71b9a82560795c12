use anyhow::{Context, Result};
use parley_checkpoint::CheckpointerProvider;
use parley_llm::MemoryClient;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

use crate::agent::Agent;
use crate::node::{Node, NodeType};
use crate::nodes::{AgentNode, MemoryNode};
use crate::router::{LinearRouter, NextNode, Router};
use crate::types::{GraphInput, GraphState, RunConfig};

/// The agent execution pipeline: START -> agent -> memory -> END.
///
/// The final state is written as the thread's checkpoint once, after the
/// last node. A run that fails before END leaves the checkpoint untouched.
pub struct Graph {
    agent: Arc<dyn Agent>,
    memory: Option<Arc<dyn MemoryClient>>,
    checkpointer: Arc<CheckpointerProvider>,
}

impl Graph {
    pub fn new(
        agent: Arc<dyn Agent>,
        memory: Option<Arc<dyn MemoryClient>>,
        checkpointer: Arc<CheckpointerProvider>,
    ) -> Self {
        Self {
            agent,
            memory,
            checkpointer,
        }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> crate::builder::GraphBuilder {
        crate::builder::GraphBuilder::new()
    }

    pub fn checkpointer(&self) -> &Arc<CheckpointerProvider> {
        &self.checkpointer
    }

    /// Run the pipeline and return the final state (full conversation)
    #[instrument(skip_all, fields(thread_id = %run.thread_id, user_id = %run.user_id))]
    pub async fn invoke(&self, input: GraphInput, run: RunConfig) -> Result<GraphState> {
        let start_time = Instant::now();
        let mut state = GraphState::from_input(input, run);

        let agent_node = AgentNode::new(Arc::clone(&self.agent));
        let memory_node = MemoryNode::new(self.memory.clone());
        let router = LinearRouter;

        let mut next = Some(NodeType::Agent);

        while let Some(current_node) = next {
            let node_start = Instant::now();
            let node: &dyn Node = match current_node {
                NodeType::Agent => &agent_node,
                NodeType::Memory => &memory_node,
            };

            node.execute(&mut state)
                .await
                .with_context(|| format!("{} step failed", node.node_type()))?;

            tracing::debug!(
                node = %current_node,
                duration_ms = node_start.elapsed().as_millis() as u64,
                messages = state.messages.len(),
                "Node executed"
            );
            state.variables.insert(
                "last_node".to_string(),
                serde_json::Value::from(current_node.to_string()),
            );

            next = match router.next(&state, current_node) {
                NextNode::Memory => Some(NodeType::Memory),
                NextNode::End => None,
            };
        }

        let saver = self.checkpointer.get().await;
        saver
            .put(&state.thread_id, &state.to_checkpoint())
            .await
            .context("Failed to write checkpoint")?;

        tracing::info!(
            run_id = %state.run_id,
            messages = state.messages.len(),
            degraded = state.is_degraded(),
            total_duration_ms = start_time.elapsed().as_millis() as u64,
            "Pipeline run completed"
        );

        Ok(state)
    }
}
