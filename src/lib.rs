//! GraphRAG Notes ML Worker
//!
//! An inference sidecar for the notes knowledge base:
//! - Batch embedding generation (local ONNX via fastembed)
//! - Pattern-based entity extraction for graph construction
//!
//! Consumed by the librarian agent over HTTP; holds no state between
//! requests.

pub mod api;
pub mod embeddings;
pub mod entities;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use embeddings::{EmbeddingEngine, EmbeddingProvider, EmbeddingSettings};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub embedding: EmbeddingYamlConfig,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self { port: 8100 }
    }
}

/// Embedding configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingYamlConfig {
    /// Short model identifier, e.g. "multilingual-e5-base"
    pub model: String,
    /// ONNX model cache directory (None = fastembed default)
    pub cache_dir: Option<String>,
    /// Load the model during startup, before accepting requests.
    /// Disable only when first-request latency is acceptable.
    pub preload: bool,
}

impl Default for EmbeddingYamlConfig {
    fn default() -> Self {
        Self {
            model: embeddings::engine::DEFAULT_MODEL.to_string(),
            cache_dir: None,
            preload: true,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub embedding_model: String,
    pub embedding_cache_dir: Option<PathBuf>,
    pub preload_model: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_yaml(YamlConfig::default())
    }
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file
    /// doesn't exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);
        let mut config = Self::from_yaml(yaml);

        if let Ok(port) = std::env::var("SERVER_PORT") {
            if let Ok(port) = port.parse() {
                config.server_port = port;
            }
        }
        if let Ok(model) = std::env::var("FASTEMBED_MODEL") {
            config.embedding_model = model;
        }
        if let Some(dir) = std::env::var("FASTEMBED_CACHE_DIR")
            .ok()
            .filter(|s| !s.is_empty())
        {
            config.embedding_cache_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        Self {
            server_port: yaml.server.port,
            embedding_model: yaml.embedding.model,
            embedding_cache_dir: yaml.embedding.cache_dir.map(PathBuf::from),
            preload_model: yaml.embedding.preload,
        }
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    fn embedding_settings(&self) -> EmbeddingSettings {
        EmbeddingSettings {
            model: self.embedding_model.clone(),
            cache_dir: self.embedding_cache_dir.clone(),
        }
    }
}

// ============================================================================
// Application state
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<EmbeddingEngine>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    ///
    /// With `preload_model` set (the default), the embedding model is
    /// loaded here, before the server accepts requests. A half-initialized
    /// model is never observable and a broken model configuration fails
    /// the process at startup instead of on the first request.
    pub async fn new(config: Config) -> Result<Self> {
        let engine = Arc::new(EmbeddingEngine::new(config.embedding_settings()));

        if config.preload_model {
            let started = Instant::now();
            let provider = engine
                .ensure_loaded()
                .await
                .context("failed to preload embedding model")?;
            tracing::info!(
                model = provider.model_name(),
                dimension = provider.dimensions(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Embedding model preloaded"
            );
        }

        Ok(Self {
            engine,
            config: Arc::new(config),
        })
    }

    /// State backed by an already-constructed provider (tests, embedding
    /// the worker into another binary).
    pub fn with_provider(config: Config, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            engine: Arc::new(EmbeddingEngine::with_provider(provider)),
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Server bootstrap
// ============================================================================

/// Start the HTTP server and serve until shutdown.
pub async fn start_server(config: Config) -> Result<()> {
    let port = config.server_port;
    let state = AppState::new(config).await?;

    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("ML worker listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
server:
  port: 9100

embedding:
  model: multilingual-e5-small
  cache_dir: /var/cache/fastembed
  preload: false
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.embedding.model, "multilingual-e5-small");
        assert_eq!(
            config.embedding.cache_dir,
            Some("/var/cache/fastembed".to_string())
        );
        assert!(!config.embedding.preload);
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.server.port, 8100);
        assert_eq!(config.embedding.model, "multilingual-e5-base");
        assert!(config.embedding.cache_dir.is_none());
        assert!(config.embedding.preload);
    }

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let yaml = r#"
server:
  port: 9200
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9200);
        assert_eq!(config.embedding.model, "multilingual-e5-base");
        assert!(config.embedding.preload);
    }

    #[test]
    fn test_load_yaml_missing_file_uses_defaults() {
        let config = Config::load_yaml(Some(Path::new("/nonexistent/config.yaml")));
        assert_eq!(config.server.port, 8100);
    }

    #[test]
    fn test_load_yaml_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 9300\nembedding:\n  model: bge-m3").unwrap();

        let config = Config::load_yaml(Some(file.path()));
        assert_eq!(config.server.port, 9300);
        assert_eq!(config.embedding.model, "bge-m3");
    }

    #[test]
    fn test_runtime_config_from_yaml() {
        let config = Config::default();
        assert_eq!(config.server_port, 8100);
        assert_eq!(config.embedding_model, "multilingual-e5-base");
        assert!(config.embedding_cache_dir.is_none());
        assert!(config.preload_model);

        let settings = config.embedding_settings();
        assert_eq!(settings.model, "multilingual-e5-base");
        assert!(settings.cache_dir.is_none());
    }
}
