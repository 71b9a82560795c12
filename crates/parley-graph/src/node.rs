use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

use crate::types::GraphState;

/// Core abstraction for a unit of computation in the graph
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute the node's logic, potentially modifying state
    async fn execute(&self, state: &mut GraphState) -> Result<()>;

    /// Return the type of this node
    fn node_type(&self) -> NodeType;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Agent,
    Memory,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Agent => f.write_str("agent"),
            NodeType::Memory => f.write_str("memory"),
        }
    }
}
