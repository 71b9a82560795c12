pub mod config;
pub mod state;

pub use config::{LLMConfig, RunConfig};
pub use state::{GraphInput, GraphState};
