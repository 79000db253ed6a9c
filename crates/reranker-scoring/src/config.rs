use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOCAL_MODEL: &str = "BAAI/bge-reranker-base";

#[derive(Debug, Clone)]
pub struct LocalScoringConfig {
    pub model: String,
    pub cache_dir: Option<PathBuf>,
    pub show_download_progress: bool,
}

impl LocalScoringConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            cache_dir: None,
            show_download_progress: false,
        }
    }
}

impl Default for LocalScoringConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_MODEL)
    }
}

#[derive(Debug, Clone)]
pub struct JinaScoringConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl JinaScoringConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "jina-reranker-v2-base-multilingual".to_string(),
            endpoint: "https://api.jina.ai/v1/rerank".to_string(),
            timeout: Duration::from_secs(8),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CohereScoringConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl CohereScoringConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "rerank-v3.5".to_string(),
            endpoint: "https://api.cohere.com/v2/rerank".to_string(),
            timeout: Duration::from_secs(8),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PineconeScoringConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub api_version: Option<String>,
}

impl PineconeScoringConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "bge-reranker-v2-m3".to_string(),
            endpoint: "https://api.pinecone.io/rerank".to_string(),
            timeout: Duration::from_secs(8),
            api_version: Some("2025-10".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ScoringBackendConfig {
    Local(LocalScoringConfig),
    Jina(JinaScoringConfig),
    Cohere(CohereScoringConfig),
    Pinecone(PineconeScoringConfig),
}

impl ScoringBackendConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Jina(_) => "jina",
            Self::Cohere(_) => "cohere",
            Self::Pinecone(_) => "pinecone",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Local(c) => &c.model,
            Self::Jina(c) => &c.model,
            Self::Cohere(c) => &c.model,
            Self::Pinecone(c) => &c.model,
        }
    }
}
