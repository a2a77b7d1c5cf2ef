//! Configuration management for the helpdesk.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - A YAML config file (`helpdesk.yaml` in the workspace)
//! - Environment variables
//! - Command-line flags
//!
//! All on-disk state (raw documents, the index, the feedback log) lives under
//! the data directory, which defaults to `<workspace>/data`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default config file name, looked up in the workspace root.
pub const CONFIG_FILE_NAME: &str = "helpdesk.yaml";

/// Embedding providers the knowledge crate knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Address the HTTP service binds to
    pub bind: String,

    /// Base URL the client subcommands talk to
    pub server_url: String,

    /// Data directory override (relative paths resolve against the workspace)
    pub data_dir: Option<PathBuf>,

    /// Embedding provider settings
    pub embedding: EmbeddingConfig,

    /// Chunking geometry used by ingest
    pub chunking: ChunkingConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Provider endpoint (ollama only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Maximum texts per embedding batch
    pub batch_size: usize,
}

/// Default model and dimensions for a provider.
pub fn provider_defaults(provider: &str) -> Option<(&'static str, usize)> {
    match provider {
        "trigram" => Some(("trigram-v1", 384)),
        "ollama" => Some(("nomic-embed-text", 768)),
        _ => None,
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::for_provider("trigram")
    }
}

impl EmbeddingConfig {
    /// Settings for `provider` with its default model and dimensions.
    pub fn for_provider(provider: &str) -> Self {
        let (model, dimensions) = provider_defaults(provider).unwrap_or(("", 0));
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            dimensions,
            endpoint: None,
            batch_size: 64,
        }
    }

    /// Switch provider. Model and dimensions reset to the new provider's
    /// defaults; the same provider leaves them alone.
    pub fn set_provider(&mut self, provider: &str) {
        if self.provider == provider {
            return;
        }
        if let Some((model, dimensions)) = provider_defaults(provider) {
            self.model = model.to_string();
            self.dimensions = dimensions;
        }
        self.provider = provider.to_string();
    }
}

/// Word-window chunking configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Words per chunk
    pub size: usize,

    /// Words shared between consecutive chunks
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 500,
            overlap: 50,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    server: Option<ServerSection>,
    data: Option<DataSection>,
    embedding: Option<EmbeddingSection>,
    chunking: Option<ChunkingConfig>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerSection {
    bind: Option<String>,
    url: Option<String>,
}

/// Embedding settings as written in the file; unset keys keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
    endpoint: Option<String>,
    batch_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DataSection {
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            bind: "127.0.0.1:8000".to_string(),
            server_url: "http://127.0.0.1:8000".to_string(),
            data_dir: None,
            embedding: EmbeddingConfig::default(),
            chunking: ChunkingConfig::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `HELPDESK_WORKSPACE`: Override workspace path
    /// - `HELPDESK_CONFIG`: Path to config file
    /// - `HELPDESK_BIND`: Server bind address
    /// - `HELPDESK_SERVER`: Base URL used by client commands
    /// - `HELPDESK_EMBEDDING_PROVIDER`: Embedding provider
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and/or config file.
    ///
    /// Explicit arguments take precedence over `HELPDESK_WORKSPACE` and
    /// `HELPDESK_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("HELPDESK_WORKSPACE")) {
            config.workspace = workspace;
        }
        config.config_file = config_file.or_else(|| env_path("HELPDESK_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.workspace.join(CONFIG_FILE_NAME));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(bind) = std::env::var("HELPDESK_BIND") {
            config.bind = bind;
        }

        if let Ok(server) = std::env::var("HELPDESK_SERVER") {
            config.server_url = server;
        }

        if let Ok(provider) = std::env::var("HELPDESK_EMBEDDING_PROVIDER") {
            config.embedding.set_provider(&provider);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merging config file {:?}", path);
        Ok(self.clone().merged_with(file))
    }

    fn merged_with(mut self, file: ConfigFile) -> Self {
        if let Some(server) = file.server {
            if let Some(bind) = server.bind {
                self.bind = bind;
            }
            if let Some(url) = server.url {
                self.server_url = url;
            }
        }

        if let Some(data) = file.data {
            if data.dir.is_some() {
                self.data_dir = data.dir;
            }
        }

        if let Some(embedding) = file.embedding {
            if let Some(provider) = embedding.provider {
                self.embedding.set_provider(&provider);
            }
            if let Some(model) = embedding.model {
                self.embedding.model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                self.embedding.dimensions = dimensions;
            }
            if embedding.endpoint.is_some() {
                self.embedding.endpoint = embedding.endpoint;
            }
            if let Some(batch_size) = embedding.batch_size {
                self.embedding.batch_size = batch_size;
            }
        }

        if let Some(chunking) = file.chunking {
            self.chunking = chunking;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        self
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    pub fn with_overrides(
        mut self,
        bind: Option<String>,
        server_url: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(bind) = bind {
            self.bind = bind;
        }

        if let Some(server_url) = server_url {
            self.server_url = server_url;
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

    /// Root of all on-disk state.
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.workspace.join(dir),
            None => self.workspace.join("data"),
        }
    }

    /// Directory holding the `*.txt` source documents.
    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir().join("raw")
    }

    /// Directory holding the built index.
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir().join("index")
    }

    /// Path of the SQLite index file.
    pub fn index_path(&self) -> PathBuf {
        self.index_dir().join("index.sqlite")
    }

    /// Directory holding evaluation data.
    pub fn eval_dir(&self) -> PathBuf {
        self.data_dir().join("eval")
    }

    /// Path of the feedback JSON Lines log.
    pub fn feedback_path(&self) -> PathBuf {
        self.eval_dir().join("feedback.jsonl")
    }

    /// Ensure the raw, index and eval directories exist.
    pub fn ensure_data_dirs(&self) -> AppResult<()> {
        for dir in [self.raw_dir(), self.index_dir(), self.eval_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.embedding.provider.as_str();
        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider != "trigram" && self.embedding.model.starts_with("trigram") {
            return Err(AppError::Config(format!(
                "Embedding model '{}' belongs to the trigram provider, not {}",
                self.embedding.model, provider
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be positive".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batch size must be positive".to_string(),
            ));
        }

        if self.chunking.size == 0 {
            return Err(AppError::Config("Chunk size must be positive".to_string()));
        }

        if self.chunking.overlap >= self.chunking.size {
            tracing::warn!(
                "Chunk overlap {} >= size {}; chunks will advance one word at a time",
                self.chunking.overlap,
                self.chunking.size
            );
        }

        Ok(())
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bind, "127.0.0.1:8000");
        assert_eq!(config.embedding.provider, "trigram");
        assert_eq!(config.chunking.size, 500);
        assert_eq!(config.chunking.overlap, 50);
        assert!(!config.verbose);
    }

    #[test]
    fn test_data_paths() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/helpdesk");

        assert_eq!(config.raw_dir(), PathBuf::from("/srv/helpdesk/data/raw"));
        assert_eq!(
            config.feedback_path(),
            PathBuf::from("/srv/helpdesk/data/eval/feedback.jsonl")
        );

        config.data_dir = Some(PathBuf::from("corpus"));
        assert_eq!(
            config.index_path(),
            PathBuf::from("/srv/helpdesk/corpus/index/index.sqlite")
        );
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "server:\n  bind: \"0.0.0.0:9000\"\nchunking:\n  size: 200\n  overlap: 20\nlogging:\n  color: false\n",
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.bind, "0.0.0.0:9000");
        assert_eq!(merged.server_url, "http://127.0.0.1:8000");
        assert_eq!(merged.chunking.size, 200);
        assert!(merged.no_color);
    }

    #[test]
    fn test_merge_yaml_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "chunking: [1, 2").unwrap();

        assert!(AppConfig::default().merge_yaml(&path).is_err());
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(
            Some("0.0.0.0:8080".to_string()),
            None,
            None,
            true,
            false,
        );

        assert_eq!(overridden.bind, "0.0.0.0:8080");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.embedding.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_chunk_size() {
        let mut config = AppConfig::default();
        config.chunking.size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_yaml_partial_embedding_uses_provider_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "embedding:\n  provider: ollama\nchunking:\n  size: 120\n").unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.embedding.provider, "ollama");
        assert_eq!(merged.embedding.model, "nomic-embed-text");
        assert_eq!(merged.embedding.dimensions, 768);
        assert_eq!(merged.embedding.batch_size, 64);
        assert_eq!(merged.chunking.size, 120);
        assert_eq!(merged.chunking.overlap, 50);
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_merge_yaml_explicit_model_wins() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "embedding:\n  provider: ollama\n  model: mxbai-embed-large\n  dimensions: 1024\n",
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.embedding.model, "mxbai-embed-large");
        assert_eq!(merged.embedding.dimensions, 1024);
    }

    #[test]
    fn test_set_provider_switches_defaults() {
        let mut embedding = EmbeddingConfig::default();
        embedding.set_provider("ollama");
        assert_eq!(embedding.model, "nomic-embed-text");
        assert_eq!(embedding.dimensions, 768);

        embedding.model = "custom".to_string();
        embedding.set_provider("ollama");
        assert_eq!(embedding.model, "custom");

        embedding.set_provider("trigram");
        assert_eq!(embedding, EmbeddingConfig::default());
    }

    #[test]
    fn test_env_provider_override_uses_provider_defaults() {
        let temp = TempDir::new().unwrap();
        std::env::set_var("HELPDESK_EMBEDDING_PROVIDER", "ollama");
        let loaded = AppConfig::load_from(Some(temp.path().to_path_buf()), None);
        std::env::remove_var("HELPDESK_EMBEDDING_PROVIDER");

        let config = loaded.unwrap();
        assert_eq!(config.embedding.provider, "ollama");
        assert_eq!(config.embedding.model, "nomic-embed-text");
        assert_eq!(config.embedding.dimensions, 768);
    }

    #[test]
    fn test_validate_rejects_trigram_model_for_ollama() {
        let mut config = AppConfig::default();
        config.embedding.provider = "ollama".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_defaults() {
        assert!(AppConfig::default().validate().is_ok());
    }
}
