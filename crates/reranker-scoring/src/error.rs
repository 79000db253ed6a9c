use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("scoring backend returned invalid response: {0}")]
    InvalidResponse(String),

    #[error("scoring backend API error: status={status}, body={body}")]
    Api { status: u16, body: String },

    #[error("model inference failed: {0}")]
    Model(String),

    #[error("inference task aborted: {0}")]
    Join(String),
}
