pub mod checkpoint;
pub mod error;
pub mod locks;
pub mod memory;
pub mod provider;
pub mod saver;
pub mod sqlite;

pub use checkpoint::{Checkpoint, MESSAGES_CHANNEL};
pub use error::CheckpointError;
pub use locks::ThreadLocks;
pub use memory::InMemorySaver;
pub use provider::{CheckpointerConfig, CheckpointerKind, CheckpointerProvider};
pub use saver::{Backend, CheckpointSaver};
pub use sqlite::SqliteSaver;
