use crate::node::NodeType;
use crate::types::GraphState;

/// Decides which node to execute next based on current state
pub trait Router: Send + Sync {
    fn next(&self, state: &GraphState, current: NodeType) -> NextNode;
}

#[derive(Debug, Clone, PartialEq)]
pub enum NextNode {
    Memory,
    End,
}

/// Fixed topology: START -> agent -> memory -> END
pub struct LinearRouter;

impl Router for LinearRouter {
    fn next(&self, _state: &GraphState, current: NodeType) -> NextNode {
        match current {
            NodeType::Agent => NextNode::Memory,
            NodeType::Memory => NextNode::End,
        }
    }
}
