use std::sync::Arc;

use anyhow::Context;
use reranker_core::RerankService;
use reranker_scoring::build_scoring_function;
use reranker_server::{RerankServer, ServerConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::from_env().context("invalid reranker configuration")?;
    tracing::info!(
        provider = config.backend.backend_name(),
        model = config.backend.model(),
        "initializing scoring backend"
    );
    let scorer = build_scoring_function(config.backend.clone())
        .context("failed to initialize scoring backend")?;

    let server = RerankServer::new(RerankService::new(scorer))
        .context("failed to start async runtime")?
        .with_max_body_bytes(config.max_body_bytes)
        .with_max_connections(config.max_connections);
    let addr = config.bind_addr();
    Arc::new(server)
        .serve_http(&addr)
        .with_context(|| format!("http server on {addr} failed"))
}
