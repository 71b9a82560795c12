#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parley_api::ChatService;
use parley_checkpoint::{
    Backend, Checkpoint, CheckpointError, CheckpointSaver, CheckpointerProvider, InMemorySaver,
};
use parley_graph::{Agent, Graph, RunConfig};
use parley_llm::Message;
use parley_persist::{NewUser, PersistenceClient, SqlitePersistenceClient, User};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replies "echo: <last message>" and records every input it was given
#[derive(Default)]
pub struct EchoAgent {
    pub inputs: Mutex<Vec<Vec<Message>>>,
    pub delay: Option<Duration>,
}

impl EchoAgent {
    pub fn slow(delay: Duration) -> Self {
        Self {
            inputs: Mutex::default(),
            delay: Some(delay),
        }
    }

    pub fn inputs(&self) -> Vec<Vec<Message>> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Agent for EchoAgent {
    async fn run(&self, mut messages: Vec<Message>, _run: &RunConfig) -> Result<Vec<Message>> {
        self.inputs.lock().unwrap().push(messages.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let last = messages.last().map(|m| m.content().to_string()).unwrap_or_default();
        messages.push(Message::ai(format!("echo: {last}")));
        Ok(messages)
    }
}

pub struct FailingAgent;

#[async_trait]
impl Agent for FailingAgent {
    async fn run(&self, _messages: Vec<Message>, _run: &RunConfig) -> Result<Vec<Message>> {
        Err(anyhow!("model unavailable"))
    }
}

/// Completes without adding anything
pub struct SilentAgent;

#[async_trait]
impl Agent for SilentAgent {
    async fn run(&self, messages: Vec<Message>, _run: &RunConfig) -> Result<Vec<Message>> {
        Ok(messages)
    }
}

/// Every operation fails
pub struct BrokenSaver;

#[async_trait]
impl CheckpointSaver for BrokenSaver {
    async fn get(&self, _thread_id: &str) -> parley_checkpoint::error::Result<Option<Checkpoint>> {
        Err(CheckpointError::Internal("disk on fire".to_string()))
    }

    async fn put(
        &self,
        _thread_id: &str,
        _checkpoint: &Checkpoint,
    ) -> parley_checkpoint::error::Result<()> {
        Err(CheckpointError::Internal("disk on fire".to_string()))
    }

    async fn delete(&self, _thread_id: &str) -> parley_checkpoint::error::Result<bool> {
        Err(CheckpointError::Internal("disk on fire".to_string()))
    }

    async fn list_threads(&self) -> parley_checkpoint::error::Result<Vec<String>> {
        Err(CheckpointError::Internal("disk on fire".to_string()))
    }

    fn backend(&self) -> Backend {
        Backend::Memory
    }
}

/// In-memory store that fails one chosen read, or every write
#[derive(Default)]
pub struct FlakySaver {
    inner: InMemorySaver,
    reads: AtomicUsize,
    failing_read: Option<usize>,
    failing_writes: bool,
}

impl FlakySaver {
    /// The `n`th `get`, counting from 1, fails
    pub fn failing_read(n: usize) -> Self {
        Self {
            failing_read: Some(n),
            ..Self::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            failing_writes: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl CheckpointSaver for FlakySaver {
    async fn get(&self, thread_id: &str) -> parley_checkpoint::error::Result<Option<Checkpoint>> {
        let call = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_read == Some(call) {
            return Err(CheckpointError::Internal("connection reset".to_string()));
        }
        self.inner.get(thread_id).await
    }

    async fn put(
        &self,
        thread_id: &str,
        checkpoint: &Checkpoint,
    ) -> parley_checkpoint::error::Result<()> {
        if self.failing_writes {
            return Err(CheckpointError::Internal("read-only filesystem".to_string()));
        }
        self.inner.put(thread_id, checkpoint).await
    }

    async fn delete(&self, thread_id: &str) -> parley_checkpoint::error::Result<bool> {
        self.inner.delete(thread_id).await
    }

    async fn list_threads(&self) -> parley_checkpoint::error::Result<Vec<String>> {
        self.inner.list_threads().await
    }

    fn backend(&self) -> Backend {
        Backend::Memory
    }
}

pub struct Harness {
    pub persist: Arc<SqlitePersistenceClient>,
    pub saver: Arc<dyn CheckpointSaver>,
    pub service: ChatService,
    pub user: User,
}

pub async fn registry() -> Arc<SqlitePersistenceClient> {
    let persist = SqlitePersistenceClient::connect("sqlite::memory:", 1)
        .await
        .unwrap();
    persist.init_schema().await.unwrap();
    Arc::new(persist)
}

pub async fn harness(agent: Arc<dyn Agent>) -> Harness {
    harness_with_saver(agent, Arc::new(InMemorySaver::new())).await
}

pub async fn harness_with_saver(
    agent: Arc<dyn Agent>,
    saver: Arc<dyn CheckpointSaver>,
) -> Harness {
    let provider = Arc::new(CheckpointerProvider::from_saver(saver));
    harness_with_provider(agent, provider).await
}

pub async fn harness_with_provider(
    agent: Arc<dyn Agent>,
    provider: Arc<CheckpointerProvider>,
) -> Harness {
    let saver = provider.get().await;
    let persist = registry().await;
    let user = persist.create_user(NewUser::new("ana")).await.unwrap();

    let graph = Graph::builder()
        .agent(agent)
        .checkpointer(provider.clone())
        .build()
        .unwrap();

    let service = ChatService::new(persist.clone(), provider, Arc::new(graph));

    Harness {
        persist,
        saver,
        service,
        user,
    }
}
