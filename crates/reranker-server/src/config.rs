use std::path::PathBuf;
use std::time::Duration;

use reranker_scoring::{
    CohereScoringConfig, JinaScoringConfig, LocalScoringConfig, PineconeScoringConfig,
    ScoringBackendConfig, DEFAULT_LOCAL_MODEL,
};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported scoring provider {0:?}; use local, jina, cohere or pinecone")]
    UnknownProvider(String),

    #[error("{provider} scoring requires an API key ({vars})")]
    MissingApiKey {
        provider: &'static str,
        vars: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub max_connections: usize,
    pub backend: ScoringBackendConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = var("RERANKER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = var("RERANKER_PORT")
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let max_body_bytes = var("RERANKER_MAX_BODY_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_BODY_BYTES)
            .clamp(1024, 256 * 1024 * 1024);
        let max_connections = var("RERANKER_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS)
            .clamp(1, 4096);
        let timeout = Duration::from_millis(
            var("RERANKER_TIMEOUT_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(8_000)
                .clamp(100, 120_000),
        );

        let provider = var("RERANKER_PROVIDER")
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_else(|| "local".to_string());
        let model = var("RERANKER_MODEL");
        let endpoint = var("RERANKER_ENDPOINT");

        let backend = match provider.as_str() {
            "local" => {
                let mut cfg = LocalScoringConfig::new(
                    model.unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string()),
                );
                cfg.cache_dir = var("RERANKER_CACHE_DIR").map(PathBuf::from);
                ScoringBackendConfig::Local(cfg)
            }
            "jina" => {
                let api_key = var("RERANKER_API_KEY")
                    .or_else(|| var("JINA_API_KEY"))
                    .ok_or(ConfigError::MissingApiKey {
                        provider: "jina",
                        vars: "RERANKER_API_KEY or JINA_API_KEY",
                    })?;
                let mut cfg = JinaScoringConfig::new(api_key);
                if let Some(model) = model {
                    cfg.model = model;
                }
                if let Some(endpoint) = endpoint {
                    cfg.endpoint = endpoint;
                }
                cfg.timeout = timeout;
                ScoringBackendConfig::Jina(cfg)
            }
            "cohere" => {
                let api_key = var("RERANKER_API_KEY")
                    .or_else(|| var("COHERE_API_KEY"))
                    .ok_or(ConfigError::MissingApiKey {
                        provider: "cohere",
                        vars: "RERANKER_API_KEY or COHERE_API_KEY",
                    })?;
                let mut cfg = CohereScoringConfig::new(api_key);
                if let Some(model) = model {
                    cfg.model = model;
                }
                if let Some(endpoint) = endpoint {
                    cfg.endpoint = endpoint;
                }
                cfg.timeout = timeout;
                ScoringBackendConfig::Cohere(cfg)
            }
            "pinecone" => {
                let api_key = var("RERANKER_API_KEY")
                    .or_else(|| var("PINECONE_API_KEY"))
                    .ok_or(ConfigError::MissingApiKey {
                        provider: "pinecone",
                        vars: "RERANKER_API_KEY or PINECONE_API_KEY",
                    })?;
                let mut cfg = PineconeScoringConfig::new(api_key);
                if let Some(model) = model {
                    cfg.model = model;
                }
                if let Some(endpoint) = endpoint {
                    cfg.endpoint = endpoint;
                }
                if let Some(version) = var("RERANKER_API_VERSION") {
                    cfg.api_version = Some(version);
                }
                cfg.timeout = timeout;
                ScoringBackendConfig::Pinecone(cfg)
            }
            other => return Err(ConfigError::UnknownProvider(other.to_string())),
        };

        Ok(Self {
            host,
            port,
            max_body_bytes,
            max_connections,
            backend,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
