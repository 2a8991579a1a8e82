//! Configuration management for Ragbot.
//!
//! Configuration is read once at startup and layered, lowest precedence first:
//! - Built-in defaults
//! - A YAML config file (`RAGBOT_CONFIG`, or `./ragbot.yaml` when present)
//! - Environment variables (a `.env` file is loaded into the environment first)
//! - Command-line flags (see [`AppConfig::with_overrides`])
//!
//! The chat-model credential is never read from the YAML file; the file can
//! only name the environment variable that holds it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Default sentence embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Environment variable holding the Gemini API key unless the config file names another.
pub const DEFAULT_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Embedding providers the knowledge crate knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["fastembed", "ollama", "trigram"];

/// Vector index backends the knowledge crate knows how to build.
pub const KNOWN_VECTOR_STORES: [&str; 2] = ["lancedb", "memory"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Embedding provider ("fastembed", "ollama", "trigram")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Endpoint for HTTP embedding providers (Ollama)
    pub embedding_endpoint: Option<String>,

    /// Chat-model provider; only "google"/"gemini" can answer questions
    pub llm_provider: String,

    /// Requested chat model name, before alias resolution
    pub llm_model: Option<String>,

    /// Sampling temperature for answers
    pub temperature: f32,

    /// Environment variable the API key is read from
    pub api_key_env: String,

    /// API key for the chat provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Vector index backend ("lancedb" or "memory")
    pub vector_store: String,

    /// Directory for the persistent vector store
    pub vector_db_path: PathBuf,

    /// Staging directory for uploaded files
    pub upload_dir: PathBuf,

    /// HTTP bind host
    pub host: String,

    /// HTTP bind port
    pub port: u16,

    /// Maximum accepted upload request size in bytes
    pub max_upload_bytes: usize,

    /// Log filter override
    pub log_level: Option<String>,

    /// Log output format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    embedding: Option<EmbeddingSection>,
    llm: Option<LlmSection>,
    storage: Option<StorageSection>,
    server: Option<ServerSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageSection {
    #[serde(rename = "vectorStore")]
    vector_store: Option<String>,
    path: Option<String>,
    #[serde(rename = "uploadDir")]
    upload_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerSection {
    host: Option<String>,
    port: Option<u16>,
    #[serde(rename = "maxUploadBytes")]
    max_upload_bytes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    format: Option<LogFormat>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            embedding_provider: "fastembed".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_endpoint: None,
            llm_provider: "google".to_string(),
            llm_model: None,
            temperature: 0.7,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
            vector_store: "lancedb".to_string(),
            vector_db_path: PathBuf::from("./vector_db"),
            upload_dir: PathBuf::from("./uploads"),
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 50 * 1024 * 1024,
            log_level: None,
            log_format: LogFormat::Text,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, config file and environment.
    ///
    /// Environment variables:
    /// - `RAGBOT_CONFIG`: Path to YAML config file
    /// - `EMBEDDING_PROVIDER`, `EMBEDDING_MODEL`, `EMBEDDING_ENDPOINT`
    /// - `LLM_PROVIDER`, `LLM_MODEL`, `LLM_TEMPERATURE`
    /// - `GOOGLE_API_KEY` (or the variable named by `llm.apiKeyEnv`)
    /// - `VECTOR_STORE`, `VECTOR_DB_PATH`, `UPLOAD_DIR`
    /// - `HOST`, `PORT`, `MAX_UPLOAD_BYTES`
    /// - `RUST_LOG`, `RAGBOT_LOG_FORMAT`, `NO_COLOR`
    ///
    /// # Example
    /// ```no_run
    /// use ragbot_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Vector store: {:?}", config.vector_db_path);
    /// ```
    pub fn load(config_file: Option<PathBuf>) -> AppResult<Self> {
        // A missing .env file is normal
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!("Loaded environment from {:?}", path);
        }

        let lookup = |key: &str| std::env::var(key).ok();

        let config_path = config_file
            .or_else(|| lookup("RAGBOT_CONFIG").map(PathBuf::from))
            .or_else(|| {
                let local = PathBuf::from("ragbot.yaml");
                local.exists().then_some(local)
            });

        let mut config = Self::default();

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "Config file does not exist: {:?}",
                    path
                )));
            }
            config = config.merge_yaml(&path)?;
        }

        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());

        if let Some(embedding) = config_file.embedding {
            if let Some(provider) = embedding.provider {
                result.embedding_provider = provider.trim().to_lowercase();
            }
            if let Some(model) = embedding.model {
                result.embedding_model = model;
            }
            if embedding.endpoint.is_some() {
                result.embedding_endpoint = embedding.endpoint;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.llm_provider = provider;
            }
            if llm.model.is_some() {
                result.llm_model = llm.model;
            }
            if let Some(temperature) = llm.temperature {
                result.temperature = temperature;
            }
            if let Some(api_key_env) = llm.api_key_env {
                result.api_key_env = api_key_env;
            }
        }

        if let Some(storage) = config_file.storage {
            if let Some(vector_store) = storage.vector_store {
                result.vector_store = vector_store.trim().to_lowercase();
            }
            if let Some(path) = storage.path {
                result.vector_db_path = PathBuf::from(path);
            }
            if let Some(upload_dir) = storage.upload_dir {
                result.upload_dir = PathBuf::from(upload_dir);
            }
        }

        if let Some(server) = config_file.server {
            if let Some(host) = server.host {
                result.host = host;
            }
            if let Some(port) = server.port {
                result.port = port;
            }
            if let Some(max_upload_bytes) = server.max_upload_bytes {
                result.max_upload_bytes = max_upload_bytes;
            }
        }

        if let Some(logging) = config_file.logging {
            if logging.level.is_some() {
                result.log_level = logging.level;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply environment variables on top of the current values.
    ///
    /// Takes a lookup function so tests never touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("EMBEDDING_PROVIDER") {
            self.embedding_provider = provider.trim().to_lowercase();
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding_model = model;
        }
        if let Some(endpoint) = lookup("EMBEDDING_ENDPOINT") {
            self.embedding_endpoint = Some(endpoint);
        }

        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm_provider = provider;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm_model = Some(model);
        }
        if let Some(temperature) = lookup("LLM_TEMPERATURE") {
            self.temperature = parse_env("LLM_TEMPERATURE", &temperature)?;
        }
        self.api_key = lookup(&self.api_key_env).filter(|key| !key.trim().is_empty());

        if let Some(vector_store) = lookup("VECTOR_STORE") {
            self.vector_store = vector_store.trim().to_lowercase();
        }
        if let Some(path) = lookup("VECTOR_DB_PATH") {
            self.vector_db_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }

        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = parse_env("PORT", &port)?;
        }
        if let Some(max) = lookup("MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_env("MAX_UPLOAD_BYTES", &max)?;
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }
        if let Some(format) = lookup("RAGBOT_LOG_FORMAT") {
            self.log_format = LogFormat::parse(&format).ok_or_else(|| {
                AppError::Config(format!("Unknown log format: {}. Supported: text, json", format))
            })?;
        }
        if lookup("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }

        if let Some(port) = port {
            self.port = port;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Socket address string the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ensure the upload staging directory exists.
    pub fn ensure_upload_dir(&self) -> AppResult<()> {
        if !self.upload_dir.exists() {
            std::fs::create_dir_all(&self.upload_dir).map_err(|e| {
                AppError::Config(format!(
                    "Failed to create upload directory {:?}: {}",
                    self.upload_dir, e
                ))
            })?;
        }
        Ok(())
    }

    /// Validate values that would make the service unusable.
    ///
    /// An unsupported chat provider or a missing API key is not an error here:
    /// those only disable answering.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding_model.trim().is_empty() {
            return Err(AppError::Config(
                "Embedding model identifier must not be empty".to_string(),
            ));
        }

        if !KNOWN_VECTOR_STORES.contains(&self.vector_store.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown vector store: {}. Supported: {}",
                self.vector_store,
                KNOWN_VECTOR_STORES.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        if self.max_upload_bytes == 0 {
            return Err(AppError::Config(
                "MAX_UPLOAD_BYTES must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid value for {}: {:?} ({})", key, value, e)))
}
