use reqwest::Client;
use serde::Deserialize;

use crate::config::PineconeScoringConfig;
use crate::error::ScoringError;
use crate::traits::ScoringFunction;
use crate::types::{positional_scores, IndexedScore};

#[derive(Clone)]
pub struct PineconeScoringFunction {
    config: PineconeScoringConfig,
    client: Client,
}

impl PineconeScoringFunction {
    pub fn new(config: PineconeScoringConfig) -> Result<Self, ScoringError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait::async_trait]
impl ScoringFunction for PineconeScoringFunction {
    fn name(&self) -> &'static str {
        "pinecone"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>, ScoringError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Pinecone takes documents as objects keyed by the rank field.
        let documents = texts
            .iter()
            .map(|text| serde_json::json!({"text": text}))
            .collect::<Vec<_>>();
        let top_n = texts.len();
        let payload = serde_json::json!({
            "model": self.config.model,
            "query": query,
            "documents": documents,
            "rank_fields": ["text"],
            "top_n": top_n,
            "return_documents": false,
        });

        let mut req = self
            .client
            .post(&self.config.endpoint)
            .header("Api-Key", &self.config.api_key)
            .json(&payload);
        if let Some(version) = &self.config.api_version {
            req = req.header("X-Pinecone-API-Version", version);
        }

        let res = req.send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            tracing::debug!(
                status,
                endpoint = %self.config.endpoint,
                "pinecone rerank request rejected"
            );
            return Err(ScoringError::Api { status, body });
        }

        let parsed: PineconeRerankResponse = res.json().await?;
        let raw_items = if parsed.data.is_empty() {
            parsed.results
        } else {
            parsed.data
        };

        positional_scores(
            texts.len(),
            raw_items.into_iter().map(|it| IndexedScore {
                index: it.index,
                score: it.score,
            }),
        )
    }
}

#[derive(Debug, Deserialize)]
struct PineconeRerankResponse {
    #[serde(default)]
    data: Vec<PineconeRerankItem>,
    #[serde(default)]
    results: Vec<PineconeRerankItem>,
}

#[derive(Debug, Deserialize)]
struct PineconeRerankItem {
    index: usize,
    #[serde(alias = "score", alias = "relevance_score")]
    score: f32,
}
