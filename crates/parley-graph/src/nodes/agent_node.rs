use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::agent::Agent;
use crate::node::{Node, NodeType};
use crate::types::GraphState;

/// Runs the agent on the full conversation and appends its reply
pub struct AgentNode {
    agent: Arc<dyn Agent>,
}

impl AgentNode {
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Node for AgentNode {
    async fn execute(&self, state: &mut GraphState) -> Result<()> {
        let output = self
            .agent
            .run(state.messages.clone(), &state.run_config())
            .await
            .context("Agent invocation failed")?;

        match output.into_iter().last() {
            Some(reply) if reply.is_ai() => {
                tracing::debug!(chars = reply.content().len(), "Agent replied");
                state.add_message(reply);
            }
            _ => {
                tracing::warn!("Agent returned no assistant message");
            }
        }

        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::Agent
    }
}
