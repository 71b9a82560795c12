use config::{Config as ConfigLoader, ConfigError, Environment, File};
use parley_checkpoint::{CheckpointerConfig, CheckpointerKind};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub checkpointer: CheckpointerSection,
    pub llm: LlmConfig,
    pub memory: MemoryConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub mem0_api_key: Option<String>,
    #[serde(default)]
    pub tavily_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointerSection {
    pub kind: CheckpointerKind,
    /// Overrides `database_url` for checkpoints (CHECKPOINTER_DATABASE_URL)
    #[serde(default)]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: String,
    /// Seconds before a model call is abandoned
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_timeout_secs() -> u64 {
    60
}

impl From<LlmConfig> for parley_graph::LLMConfig {
    fn from(config: LlmConfig) -> Self {
        Self {
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    pub enabled: bool,
    pub base_url: String,
    pub search_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub enabled: bool,
    pub base_url: String,
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (ENV defaults to "dev")
    /// 3. Environment variables: PARLEY_<SECTION>__<KEY>, e.g. PARLEY_SERVER__PORT
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            // 1. Load default config
            .add_source(File::with_name("config/default").required(false))
            // 2. Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // 3. Environment variables override everything
            .add_source(
                Environment::with_prefix("PARLEY")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.origins")
                    .try_parsing(true),
            );

        let config = builder.build()?;

        let mut cfg: Config = config.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.apply_secrets(|key| std::env::var(key).ok())?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Fill secrets from `lookup`, failing on any required one that is missing
    pub fn apply_secrets(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    ConfigError::Message(format!("{key} environment variable is required"))
                })
        };

        self.database_url = required("DATABASE_URL")?;
        self.openai_api_key = required("OPENAI_API_KEY")?;

        if self.memory.enabled {
            self.mem0_api_key = Some(required("MEM0_API_KEY")?);
        }
        if self.search.enabled {
            self.tavily_api_key = Some(required("TAVILY_API_KEY")?);
        }
        if let Some(url) = lookup("CHECKPOINTER_DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.checkpointer.database_url = Some(url);
        }

        Ok(())
    }

    /// Checkpointer settings; the registry database is reused unless overridden
    pub fn checkpointer_config(&self) -> CheckpointerConfig {
        let database_url = match self.checkpointer.kind {
            CheckpointerKind::Memory => None,
            CheckpointerKind::Sqlite => self
                .checkpointer
                .database_url
                .clone()
                .or_else(|| Some(self.database_url.clone()).filter(|url| !url.is_empty())),
        };

        CheckpointerConfig {
            kind: self.checkpointer.kind,
            database_url,
        }
    }
}
