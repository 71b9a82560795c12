use chrono::{DateTime, Utc};
use parley_llm::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the channel that carries the conversation
pub const MESSAGES_CHANNEL: &str = "messages";

/// Latest execution state for one thread token.
///
/// Writes replace the whole value; there is no delta format. `channel_values`
/// holds auxiliary channels that the reconciler never interprets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default)]
    pub channel_values: Map<String, Value>,

    /// Identity of the pipeline run that produced this state
    #[serde(default)]
    pub run_id: String,

    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            channel_values: Map::new(),
            run_id: uuid::Uuid::new_v4().to_string(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_channel(mut self, name: impl Into<String>, value: Value) -> Self {
        self.channel_values.insert(name.into(), value);
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// True when the messages channel holds nothing
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
