use std::sync::Arc;

use crate::config::ScoringBackendConfig;
use crate::error::ScoringError;
use crate::providers::{CohereScoringFunction, JinaScoringFunction, PineconeScoringFunction};
use crate::traits::ScoringFunction;

pub fn build_scoring_function(
    cfg: ScoringBackendConfig,
) -> Result<Arc<dyn ScoringFunction>, ScoringError> {
    match cfg {
        ScoringBackendConfig::Local(c) => build_local(c),
        ScoringBackendConfig::Jina(c) => Ok(Arc::new(JinaScoringFunction::new(c)?)),
        ScoringBackendConfig::Cohere(c) => Ok(Arc::new(CohereScoringFunction::new(c)?)),
        ScoringBackendConfig::Pinecone(c) => Ok(Arc::new(PineconeScoringFunction::new(c)?)),
    }
}

#[cfg(feature = "local-model")]
fn build_local(
    cfg: crate::config::LocalScoringConfig,
) -> Result<Arc<dyn ScoringFunction>, ScoringError> {
    Ok(Arc::new(crate::providers::LocalCrossEncoder::load(cfg)?))
}

#[cfg(not(feature = "local-model"))]
fn build_local(
    cfg: crate::config::LocalScoringConfig,
) -> Result<Arc<dyn ScoringFunction>, ScoringError> {
    Err(ScoringError::Config(format!(
        "local model {} requested but this build lacks the local-model feature",
        cfg.model
    )))
}
