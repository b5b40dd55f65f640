use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub schema: SchemaConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the HTTP API on
    #[serde(default = "default_host")]
    pub host: String,
    /// HTTP API port (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    /// Server-side statement timeout applied to every generated query
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_statement_timeout() -> u64 {
    10_000
}

impl DatabaseConfig {
    /// Connection URL with the password removed, for log lines
    pub fn redacted_url(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(mut parsed) => {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("****"));
                }
                parsed.to_string()
            }
            Err(_) => "<unparseable database url>".to_string(),
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.redacted_url())
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("statement_timeout_ms", &self.statement_timeout_ms)
            .finish()
    }
}

/// OpenAI-compatible chat completions endpoint
#[derive(Clone, Deserialize)]
pub struct LlmConfig {
    /// API key for the text-generation service
    #[serde(default)]
    pub api_key: String,
    /// API base URL
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Model to use
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Request timeout
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_llm_max_tokens() -> u32 {
    1000
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &if self.is_configured() { "****" } else { "" })
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Path to the schema description text given to the model
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Human label for the current season (e.g., "2025-26")
    #[serde(default = "default_season_label")]
    pub current_season: String,
    /// Season id the store uses for the current season
    #[serde(default = "default_season_id")]
    pub current_season_id: i64,
    /// Longest question accepted from a caller
    #[serde(default = "default_max_question_chars")]
    pub max_question_chars: usize,
    /// Longest generated query the sanitizer lets through
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
    /// Rows shown to the model when interpreting a result
    #[serde(default = "default_max_result_rows")]
    pub max_result_rows: usize,
    /// Render simple single-row answers locally from the generated template
    #[serde(default = "default_answer_templates")]
    pub answer_templates: bool,
}

fn default_season_label() -> String {
    "2025-26".to_string()
}

fn default_season_id() -> i64 {
    22025
}

fn default_max_question_chars() -> usize {
    500
}

fn default_max_query_chars() -> usize {
    5000
}

fn default_max_result_rows() -> usize {
    50
}

fn default_answer_templates() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            current_season: default_season_label(),
            current_season_id: default_season_id(),
            max_question_chars: default_max_question_chars(),
            max_query_chars: default_max_query_chars(),
            max_result_rows: default_max_result_rows(),
            answer_templates: default_answer_templates(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let mut builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 5)?
            .set_default("llm.api_key", "")?
            .set_default("schema.path", "config/schema.txt")?;

        // Conventional variables sit below every other source
        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_default("database.url", url)?;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            builder = builder.set_default("llm.api_key", key)?;
        }

        let builder = builder
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("ORACLE_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (ORACLE__DATABASE__URL, etc.)
            .add_source(
                Environment::with_prefix("ORACLE")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database.url.trim().is_empty() {
            errors.push("database.url (or DATABASE_URL) must be set".to_string());
        }

        if self.database.max_connections == 0 {
            errors.push("database.max_connections must be positive".to_string());
        }

        if self.database.statement_timeout_ms == 0 {
            errors.push("database.statement_timeout_ms must be positive".to_string());
        }

        if !self.llm.is_configured() {
            errors.push("llm.api_key (or OPENAI_API_KEY) must be set".to_string());
        }

        if self.llm.timeout_secs == 0 {
            errors.push("llm.timeout_secs must be positive".to_string());
        }

        if self.schema.path.as_os_str().is_empty() {
            errors.push("schema.path must be set".to_string());
        }

        if self.pipeline.max_question_chars == 0 {
            errors.push("pipeline.max_question_chars must be positive".to_string());
        }

        if self.pipeline.max_query_chars == 0 {
            errors.push("pipeline.max_query_chars must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
