use reqwest::Client;
use serde::Deserialize;

use crate::config::JinaScoringConfig;
use crate::error::ScoringError;
use crate::traits::ScoringFunction;
use crate::types::{positional_scores, IndexedScore};

#[derive(Clone)]
pub struct JinaScoringFunction {
    config: JinaScoringConfig,
    client: Client,
}

impl JinaScoringFunction {
    pub fn new(config: JinaScoringConfig) -> Result<Self, ScoringError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait::async_trait]
impl ScoringFunction for JinaScoringFunction {
    fn name(&self) -> &'static str {
        "jina"
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
                "jina rerank request rejected"
            );
            return Err(ScoringError::Api { status, body });
        }

        let parsed: JinaRerankResponse = res.json().await?;
        positional_scores(
            texts.len(),
            parsed.results.into_iter().map(|it| IndexedScore {
                index: it.index,
                score: it.relevance_score,
            }),
        )
    }
}

#[derive(Debug, Deserialize)]
struct JinaRerankResponse {
    results: Vec<JinaRerankItem>,
}

#[derive(Debug, Deserialize)]
struct JinaRerankItem {
    index: usize,
    relevance_score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::serve_once;

    fn provider(endpoint: String) -> JinaScoringFunction {
        let mut cfg = JinaScoringConfig::new("jina-test-key");
        cfg.endpoint = endpoint;
        JinaScoringFunction::new(cfg).expect("jina provider")
    }

    #[tokio::test]
    async fn scores_come_back_in_input_order() {
        let (endpoint, captured) = serve_once(
            200,
            r#"{"results":[{"index":1,"relevance_score":0.92},{"index":0,"relevance_score":0.13}]}"#,
        );
        let texts = vec![
            "weather forecast for tomorrow".to_string(),
            "Q3 budget review meeting notes".to_string(),
        ];

        let scores = provider(endpoint)
            .score_batch("budget meeting", &texts)
            .await
            .expect("scores");
        assert_eq!(scores.len(), 2);
        assert!((scores[0] - 0.13).abs() < 1e-6);
        assert!((scores[1] - 0.92).abs() < 1e-6);

        let req = captured.recv().expect("captured request");
        assert!(req.head.to_ascii_lowercase().contains("authorization: bearer jina-test-key"));
        let body: serde_json::Value = serde_json::from_str(&req.body).expect("request json");
        assert_eq!(body["top_n"], 2);
        assert_eq!(body["query"], "budget meeting");
        assert_eq!(body["return_documents"], false);
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let (endpoint, _captured) = serve_once(429, r#"{"detail":"rate limited"}"#);
        let err = provider(endpoint)
            .score_batch("q", &["a".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScoringError::Api { status: 429, ref body } if body.contains("rate limited")
        ));
    }

    #[tokio::test]
    async fn empty_batch_skips_the_request() {
        let provider = provider("http://127.0.0.1:9/rerank".to_string());
        let scores = provider.score_batch("q", &[]).await.expect("empty");
        assert!(scores.is_empty());
    }
}
