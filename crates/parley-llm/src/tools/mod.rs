pub mod memory;
pub mod web_search;

pub use memory::{Mem0Client, MemoryClient, MemoryRecord, RecordRole};
pub use web_search::{SearchClient, SearchResult, TavilyClient};
