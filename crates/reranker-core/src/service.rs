use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use reranker_scoring::{ScoringError, ScoringFunction};

use crate::error::RerankError;
use crate::types::{RerankRequest, RerankResponse, RerankResult};

/// Scores every candidate against the query in one batch and orders them
/// best-first.
///
/// The scorer is loaded once at startup and shared by all requests; the
/// service itself keeps no per-request state.
#[derive(Clone)]
pub struct RerankService {
    scorer: Arc<dyn ScoringFunction>,
}

impl RerankService {
    pub fn new(scorer: Arc<dyn ScoringFunction>) -> Self {
        Self { scorer }
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    pub fn model(&self) -> &str {
        self.scorer.model()
    }

    pub async fn rerank(&self, request: &RerankRequest) -> Result<RerankResponse, RerankError> {
        if request.documents.is_empty() {
            return Ok(RerankResponse::default());
        }

        let texts = request
            .documents
            .iter()
            .map(|doc| doc.text.clone())
            .collect::<Vec<_>>();
        tracing::debug!(documents = texts.len(), "scoring rerank batch");

        let started = Instant::now();
        let scores = self
            .scorer
            .score_batch(&request.query, &texts)
            .await
            .inspect_err(|err| {
                tracing::warn!(scorer = self.scorer.name(), error = %err, "scoring failed");
            })?;
        tracing::debug!(
            scorer = self.scorer.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scoring finished"
        );

        if scores.len() != texts.len() {
            tracing::warn!(
                expected = texts.len(),
                actual = scores.len(),
                "scorer returned mismatched score count"
            );
            return Err(RerankError::InternalConsistency {
                expected: texts.len(),
                actual: scores.len(),
            });
        }
        if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
            return Err(ScoringError::InvalidResponse(format!(
                "non-finite score for document at position {index}"
            ))
            .into());
        }

        let mut results = request
            .documents
            .iter()
            .zip(scores)
            .map(|(doc, score)| RerankResult {
                id: doc.id.clone(),
                score,
            })
            .collect::<Vec<_>>();
        // Scores are finite here, so partial_cmp is total and treats -0.0 == 0.0.
        // sort_by is stable: equal scores keep input order.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        Ok(RerankResponse { results })
    }
}
