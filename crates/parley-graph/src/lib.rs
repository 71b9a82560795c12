pub mod agent;
pub mod builder;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod outcome;
pub mod router;
pub mod supervisor;
pub mod types;

pub use agent::Agent;
pub use builder::GraphBuilder;
pub use graph::Graph;
pub use node::{Node, NodeType};
pub use nodes::{AgentNode, MemoryNode};
pub use outcome::{best_effort, Outcome};
pub use router::{LinearRouter, NextNode, Router};
pub use supervisor::SupervisorAgent;
pub use types::{GraphInput, GraphState, LLMConfig, RunConfig};
