use std::sync::Arc;

use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use parking_lot::Mutex;

use crate::config::LocalScoringConfig;
use crate::error::ScoringError;
use crate::traits::ScoringFunction;
use crate::types::{positional_scores, IndexedScore};

/// In-process cross-encoder backed by ONNX Runtime through fastembed.
///
/// The session needs exclusive access while it runs, so concurrent requests
/// queue on the mutex. Inference runs on the blocking pool.
pub struct LocalCrossEncoder {
    model_id: String,
    model: Arc<Mutex<TextRerank>>,
}

impl LocalCrossEncoder {
    pub fn load(config: LocalScoringConfig) -> Result<Self, ScoringError> {
        let variant = resolve_model(&config.model)?;
        let mut options = RerankInitOptions::new(variant)
            .with_show_download_progress(config.show_download_progress);
        if let Some(dir) = config.cache_dir.clone() {
            options = options.with_cache_dir(dir);
        }

        tracing::info!(model = %config.model, "loading local cross-encoder");
        let model = TextRerank::try_new(options).map_err(|e| {
            ScoringError::Model(format!("failed to load {}: {e}", config.model))
        })?;

        Ok(Self {
            model_id: config.model,
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait::async_trait]
impl ScoringFunction for LocalCrossEncoder {
    fn name(&self) -> &'static str {
        "local"
    }

    fn model(&self) -> &str {
        &self.model_id
    }

    async fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>, ScoringError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let query = query.to_string();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            let documents = texts.iter().map(String::as_str).collect::<Vec<_>>();
            let results = model
                .lock()
                .rerank(query.as_str(), documents.as_slice(), false, None)
                .map_err(|e| ScoringError::Model(e.to_string()))?;
            // fastembed returns results sorted by score, keyed by input index.
            positional_scores(
                texts.len(),
                results.into_iter().map(|r| IndexedScore {
                    index: r.index,
                    score: r.score,
                }),
            )
        })
        .await
        .map_err(|e| ScoringError::Join(e.to_string()))?
    }
}

fn resolve_model(name: &str) -> Result<RerankerModel, ScoringError> {
    match name.trim() {
        "BAAI/bge-reranker-base" => Ok(RerankerModel::BGERerankerBase),
        "BAAI/bge-reranker-v2-m3" | "rozgo/bge-reranker-v2-m3" => {
            Ok(RerankerModel::BGERerankerV2M3)
        }
        "jinaai/jina-reranker-v1-turbo-en" => Ok(RerankerModel::JINARerankerV1TurboEn),
        "jinaai/jina-reranker-v2-base-multilingual" => {
            Ok(RerankerModel::JINARerankerV2BaseMultiligual)
        }
        other => Err(ScoringError::Config(format!(
            "unsupported local reranker model: {other}"
        ))),
    }
}
