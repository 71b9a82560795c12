pub mod agent_node;
pub mod memory_node;

pub use agent_node::AgentNode;
pub use memory_node::MemoryNode;
