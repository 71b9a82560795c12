use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parley message types (provider-agnostic, role fixed at construction)
///
/// Serialized as `{"role": ..., "content": ...}`. Roles this crate does not
/// model (tool output, function calls, ...) deserialize into `Unknown` with
/// their original role kept, so one foreign entry never poisons a history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMessage", into = "RawMessage")]
pub enum Message {
    /// System prompt (instructions)
    System { content: String },

    /// User/Human message
    Human { content: String },

    /// Assistant/AI message
    AI { content: String },

    /// Any other role, carried through untouched
    Unknown { role: String, content: String },
}

impl Message {
    /// Create system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Create human message
    pub fn human(content: impl Into<String>) -> Self {
        Self::Human {
            content: content.into(),
        }
    }

    /// Create AI message
    pub fn ai(content: impl Into<String>) -> Self {
        Self::AI {
            content: content.into(),
        }
    }

    /// Get role as string
    pub fn role(&self) -> &str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "user",
            Self::AI { .. } => "assistant",
            Self::Unknown { role, .. } => role,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::Human { content }
            | Self::AI { content }
            | Self::Unknown { content, .. } => content,
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, Self::Human { .. })
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, Self::AI { .. })
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

/// Wire shape shared by every role
#[derive(Serialize, Deserialize)]
struct RawMessage {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: Value,
}

impl From<RawMessage> for Message {
    fn from(raw: RawMessage) -> Self {
        let content = match raw.content {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };

        match raw.role.as_str() {
            "system" => Self::System { content },
            "user" => Self::Human { content },
            "assistant" => Self::AI { content },
            _ => Self::Unknown {
                role: raw.role,
                content,
            },
        }
    }
}

impl From<Message> for RawMessage {
    fn from(message: Message) -> Self {
        let role = message.role().to_string();
        let content = match message {
            Message::System { content }
            | Message::Human { content }
            | Message::AI { content }
            | Message::Unknown { content, .. } => content,
        };
        Self {
            role,
            content: Value::String(content),
        }
    }
}
