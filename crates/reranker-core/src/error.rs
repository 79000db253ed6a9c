use reranker_scoring::ScoringError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RerankError {
    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("scoring returned {actual} scores for {expected} documents")]
    InternalConsistency { expected: usize, actual: usize },
}
