pub mod types;
pub mod traits;
pub mod openai;
pub mod tools;

pub use traits::{ChatClient, ChatRequest, ChatResponse, ChatOptions, TokenUsage};
pub use openai::OpenAIClient;
pub use types::Message;
pub use tools::{
    MemoryClient, MemoryRecord, RecordRole, Mem0Client,
    SearchClient, SearchResult, TavilyClient,
};
