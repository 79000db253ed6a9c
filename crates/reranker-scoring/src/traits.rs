use async_trait::async_trait;

use crate::error::ScoringError;

/// A pairwise relevance model that scores every text against one query.
///
/// `score_batch` must return exactly one score per input text, in input order.
/// Scores are only comparable within a single call.
#[async_trait]
pub trait ScoringFunction: Send + Sync {
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    async fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>, ScoringError>;
}
