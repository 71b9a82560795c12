use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley_api::{build_router, config::Config, service::ChatService, state::AppState};
use parley_checkpoint::CheckpointerProvider;
use parley_graph::{Graph, SupervisorAgent};
use parley_llm::{ChatClient, Mem0Client, MemoryClient, OpenAIClient, TavilyClient};
use parley_persist::{PersistClientBuilder, PersistenceClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting Parley API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Conversation registry
    let persist: Arc<dyn PersistenceClient> = Arc::new(
        PersistClientBuilder::new()
            .database_url(&config.database_url)
            .max_connections(config.database.max_connections)
            .build()
            .await
            .context("Failed to open registry database")?,
    );

    // Checkpoint store (durable failures degrade to in-memory inside the provider)
    let checkpointer = Arc::new(
        CheckpointerProvider::new(config.checkpointer_config())
            .context("Invalid checkpointer configuration")?,
    );
    tracing::info!(
        configured = ?checkpointer.configured_kind(),
        backend = %checkpointer.backend().await,
        "Checkpointer ready"
    );

    // Collaborators
    let chat_client: Arc<dyn ChatClient> = Arc::new(
        OpenAIClient::new(config.openai_api_key.clone())?
            .with_timeout(Duration::from_secs(config.llm.timeout_secs)),
    );

    let memory: Option<Arc<dyn MemoryClient>> = match &config.mem0_api_key {
        Some(key) if config.memory.enabled => {
            tracing::info!("Long-term memory enabled");
            let client: Arc<dyn MemoryClient> =
                Arc::new(Mem0Client::with_base_url(key.clone(), &config.memory.base_url)?);
            Some(client)
        }
        _ => None,
    };

    let mut agent = SupervisorAgent::new(chat_client, config.llm.clone().into());
    if let Some(memory) = &memory {
        agent = agent.with_memory(memory.clone(), config.memory.search_limit);
    }
    if let Some(key) = config.tavily_api_key.as_ref().filter(|_| config.search.enabled) {
        tracing::info!("Web search enabled");
        let search = TavilyClient::with_base_url(key.clone(), &config.search.base_url)?
            .with_max_results(config.search.max_results);
        agent = agent.with_search(Arc::new(search));
    }

    // Pipeline
    let mut graph = Graph::builder()
        .agent(Arc::new(agent))
        .checkpointer(checkpointer.clone());
    if let Some(memory) = memory {
        graph = graph.memory(memory);
    }
    let graph = Arc::new(graph.build()?);

    // Create application state
    let chats = ChatService::new(persist.clone(), checkpointer, graph);
    let state = Arc::new(AppState::new(config.clone(), persist, chats));

    // Build router
    let app = build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/api/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
