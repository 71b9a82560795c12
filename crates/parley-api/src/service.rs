//! Chat service: keeps the thread registry and the checkpoint store in
//! agreement and runs the pipeline for each incoming message.

use parley_checkpoint::{Backend, CheckpointError, CheckpointerProvider, ThreadLocks};
use parley_graph::{best_effort, Graph, GraphInput, Outcome, RunConfig};
use parley_llm::Message;
use parley_persist::{PersistError, PersistenceClient, Thread};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Characters of the first message kept in a derived title
pub const TITLE_PREFIX_CHARS: usize = 20;

/// Reply when the pipeline completes without an assistant message
pub const NO_RESPONSE_REPLY: &str = "No response from AI";

/// Reply when the pipeline fails
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error processing your message.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Chat not found: {0}")]
    ThreadNotFound(i64),

    #[error("Chat {0} belongs to another user")]
    Forbidden(i64),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
    Unknown,
}

/// Display-ready message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryMessage {
    pub role: HistoryRole,
    pub content: String,
}

impl From<&Message> for HistoryMessage {
    fn from(message: &Message) -> Self {
        let role = match message {
            Message::Human { .. } => HistoryRole::User,
            Message::AI { .. } => HistoryRole::Assistant,
            Message::System { .. } | Message::Unknown { .. } => HistoryRole::Unknown,
        };
        Self {
            role,
            content: message.content().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatHistory {
    pub messages: Vec<HistoryMessage>,
    pub title: Option<String>,
    pub thread_id: String,
}

/// Title for a thread, derived from its first message
pub fn derive_title(content: &str) -> String {
    let prefix: String = content.chars().take(TITLE_PREFIX_CHARS).collect();
    format!("{prefix}...")
}

// Targeted writes report a deleted row as missing
fn not_found_as(chat_id: i64, err: PersistError) -> ChatError {
    match err {
        PersistError::ThreadNotFound(_) => ChatError::ThreadNotFound(chat_id),
        other => ChatError::Persist(other),
    }
}

pub struct ChatService {
    persist: Arc<dyn PersistenceClient>,
    checkpointer: Arc<CheckpointerProvider>,
    graph: Arc<Graph>,
    locks: ThreadLocks,
}

impl ChatService {
    pub fn new(
        persist: Arc<dyn PersistenceClient>,
        checkpointer: Arc<CheckpointerProvider>,
        graph: Arc<Graph>,
    ) -> Self {
        Self {
            persist,
            checkpointer,
            graph,
            locks: ThreadLocks::new(),
        }
    }

    pub async fn create_chat(&self, user_id: i64, title: Option<String>) -> Result<Thread, ChatError> {
        let thread = self.persist.create_thread(user_id, title).await?;
        tracing::info!(chat_id = thread.id, thread_id = %thread.thread_id, "Chat created");
        Ok(thread)
    }

    pub async fn list_chats(
        &self,
        user_id: i64,
        limit: Option<i64>,
        skip: Option<i64>,
    ) -> Result<Vec<Thread>, ChatError> {
        Ok(self.persist.list_threads(user_id, limit, skip).await?)
    }

    /// Resolve a chat the caller may use. Soft-deleted chats count as missing.
    pub async fn authorize(&self, chat_id: i64, user_id: i64) -> Result<Thread, ChatError> {
        let thread = self
            .persist
            .get_thread(chat_id)
            .await?
            .filter(|t| !t.is_deleted)
            .ok_or(ChatError::ThreadNotFound(chat_id))?;

        if !thread.is_owned_by(user_id) {
            tracing::warn!(chat_id, user_id, "Rejected access to another user's chat");
            return Err(ChatError::Forbidden(chat_id));
        }

        Ok(thread)
    }

    /// Message history from the thread's checkpoint.
    ///
    /// Never fails: an unreadable checkpoint yields an empty, degraded history.
    #[instrument(skip_all, fields(thread_id = %thread.thread_id))]
    pub async fn get_history(&self, thread: &Thread) -> Outcome<ChatHistory> {
        let saver = self.checkpointer.get().await;

        best_effort("checkpoint_read", saver.get(&thread.thread_id), || None)
            .await
            .map(|checkpoint| ChatHistory {
                messages: checkpoint
                    .map(|c| c.messages.iter().map(HistoryMessage::from).collect())
                    .unwrap_or_default(),
                title: thread.title.clone(),
                thread_id: thread.thread_id.clone(),
            })
    }

    /// Append a user message, run the pipeline and return the reply.
    ///
    /// Registry failures and a chat deleted while the request waited are
    /// returned as errors. A checkpoint store that cannot be read skips the
    /// run and gives `FALLBACK_REPLY`, leaving the stored history intact;
    /// only an absent or corrupt checkpoint starts over from empty.
    /// Pipeline failures give `FALLBACK_REPLY`, a run without an assistant
    /// message gives `NO_RESPONSE_REPLY`; all of these are `Degraded`.
    #[instrument(skip_all, fields(thread_id = %thread.thread_id, user_id = user_id))]
    pub async fn append_and_run(
        &self,
        thread: &mut Thread,
        user_id: i64,
        content: &str,
    ) -> Result<Outcome<String>, ChatError> {
        // held for read -> run -> checkpoint write
        let _guard = self.locks.acquire(&thread.thread_id).await;

        // the caller's copy may predate a write that held the lock before us
        match self.persist.get_thread(thread.id).await? {
            Some(fresh) if !fresh.is_deleted => *thread = fresh,
            _ => return Err(ChatError::ThreadNotFound(thread.id)),
        }

        let saver = self.checkpointer.get().await;
        let mut degradations = Vec::new();
        let mut messages = match saver.get(&thread.thread_id).await {
            Ok(checkpoint) => checkpoint.map(|c| c.messages).unwrap_or_default(),
            Err(CheckpointError::Serialization(e)) => {
                tracing::warn!(error = %e, "Checkpoint is corrupt, starting from an empty history");
                degradations.push(format!("checkpoint_read: {e}"));
                Vec::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "Checkpoint read failed, run skipped");
                return Ok(Outcome::degraded(
                    FALLBACK_REPLY.to_string(),
                    format!("checkpoint_read: {e}"),
                ));
            }
        };

        let title_if_unset = messages.is_empty().then(|| derive_title(content));
        messages.push(Message::human(content));
        let input_len = messages.len();

        *thread = self
            .persist
            .record_activity(thread.id, title_if_unset.as_deref())
            .await
            .map_err(|e| not_found_as(thread.id, e))?;

        let run = RunConfig::new(thread.thread_id.clone(), user_id.to_string());
        let state = match self.graph.invoke(GraphInput::new(messages), run).await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "Pipeline run failed");
                return Ok(Outcome::degraded(FALLBACK_REPLY.to_string(), format!("{e:#}")));
            }
        };

        let reply = state.messages[input_len.min(state.messages.len())..]
            .iter()
            .rev()
            .find(|m| m.is_ai())
            .map(|m| m.content().to_string());
        degradations.extend(state.degradations);

        Ok(match reply {
            Some(reply) if degradations.is_empty() => Outcome::Completed(reply),
            Some(reply) => Outcome::degraded(reply, degradations.join("; ")),
            None => {
                tracing::warn!("Pipeline produced no assistant message");
                Outcome::degraded(
                    NO_RESPONSE_REPLY.to_string(),
                    "pipeline produced no assistant message",
                )
            }
        })
    }

    /// Set the title of a live chat and return the stored row
    pub async fn rename_chat(&self, thread: &Thread, title: &str) -> Result<Thread, ChatError> {
        self.persist
            .rename_thread(thread.id, title)
            .await
            .map_err(|e| not_found_as(thread.id, e))
    }

    /// Soft delete. The checkpoint is left in place.
    pub async fn delete_chat(&self, thread: &Thread) -> Result<(), ChatError> {
        self.persist
            .soft_delete_thread(thread.id)
            .await
            .map_err(|e| not_found_as(thread.id, e))?;
        tracing::info!(chat_id = thread.id, thread_id = %thread.thread_id, "Chat soft-deleted");
        Ok(())
    }

    /// Backend serving checkpoints
    pub async fn checkpoint_backend(&self) -> Backend {
        self.checkpointer.backend().await
    }
}
