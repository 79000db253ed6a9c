use reqwest::Client;
use serde::Deserialize;

use crate::config::CohereScoringConfig;
use crate::error::ScoringError;
use crate::traits::ScoringFunction;
use crate::types::{positional_scores, IndexedScore};

#[derive(Clone)]
pub struct CohereScoringFunction {
    config: CohereScoringConfig,
    client: Client,
}

impl CohereScoringFunction {
    pub fn new(config: CohereScoringConfig) -> Result<Self, ScoringError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait::async_trait]
impl ScoringFunction for CohereScoringFunction {
    fn name(&self) -> &'static str {
        "cohere"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>, ScoringError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let payload = serde_json::json!({
            "model": self.config.model,
            "query": query,
            "documents": texts,
            "top_n": texts.len(),
            "return_documents": false,
        });

        let res = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            tracing::debug!(
                status,
                endpoint = %self.config.endpoint,
                "cohere rerank request rejected"
            );
            return Err(ScoringError::Api { status, body });
        }

        let parsed: CohereRerankResponse = res.json().await?;
        positional_scores(
            texts.len(),
            parsed.results.into_iter().map(|it| IndexedScore {
                index: it.index,
                score: it.score,
            }),
        )
    }
}

#[derive(Debug, Deserialize)]
struct CohereRerankResponse {
    results: Vec<CohereRerankItem>,
}

#[derive(Debug, Deserialize)]
struct CohereRerankItem {
    index: usize,
    #[serde(alias = "relevance_score", alias = "score")]
    score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::serve_once;

    #[test]
    fn cohere_response_score_aliases_parse() {
        let v1 = r#"{"results":[{"index":1,"relevance_score":0.91}]}"#;
        let p1: CohereRerankResponse = serde_json::from_str(v1).expect("parse cohere v1");
        assert_eq!(p1.results[0].index, 1);
        assert!((p1.results[0].score - 0.91).abs() < 1e-6);

        let v2 = r#"{"results":[{"index":0,"score":0.77}]}"#;
        let p2: CohereRerankResponse = serde_json::from_str(v2).expect("parse cohere v2");
        assert_eq!(p2.results[0].index, 0);
        assert!((p2.results[0].score - 0.77).abs() < 1e-6);
    }

    #[tokio::test]
    async fn truncated_results_are_invalid() {
        let (endpoint, _captured) =
            serve_once(200, r#"{"results":[{"index":0,"relevance_score":0.4}]}"#);
        let mut cfg = CohereScoringConfig::new("cohere-test-key");
        cfg.endpoint = endpoint;
        let provider = CohereScoringFunction::new(cfg).expect("cohere provider");

        let err = provider
            .score_batch("q", &["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::InvalidResponse(_)));
    }
}
