use std::io;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use reranker_core::{RerankError, RerankRequest, RerankService};
use serde_json::json;
use tokio::runtime::Runtime;

use crate::config::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_CONNECTIONS};
use crate::http::{
    drain_available, read_http_request, write_http_response, HttpRequest, HttpResponse, Inbound,
    MAX_HEAD_BYTES,
};

const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP front end for [`RerankService`].
///
/// Each connection carries one request and is served on its own thread, up to
/// `max_connections` at once; connections beyond that get a 503. The scoring
/// call is driven on a runtime shared by all connections.
pub struct RerankServer {
    service: RerankService,
    runtime: Runtime,
    max_body_bytes: usize,
    max_connections: usize,
    in_flight: Arc<AtomicUsize>,
}

/// Holds one in-flight connection slot until dropped.
struct ConnectionSlot(Arc<AtomicUsize>);

impl ConnectionSlot {
    fn acquire(counter: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        let mut current = counter.load(Ordering::Acquire);
        loop {
            if current >= max {
                return None;
            }
            match counter.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(Self(Arc::clone(counter))),
                Err(actual) => current = actual,
            }
        }
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl RerankServer {
    pub fn new(service: RerankService) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("reranker-worker")
            .enable_all()
            .build()?;
        Ok(Self {
            service,
            runtime,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn serve_http(self: Arc<Self>, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        self.serve_listener(listener)
    }

    pub fn serve_listener(self: Arc<Self>, listener: TcpListener) -> io::Result<()> {
        tracing::info!(
            addr = %listener.local_addr()?,
            provider = self.service.scorer_name(),
            model = self.service.model(),
            "reranker http listening"
        );
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let Some(slot) = ConnectionSlot::acquire(&self.in_flight, self.max_connections)
                    else {
                        tracing::warn!(
                            max_connections = self.max_connections,
                            "connection limit reached, rejecting"
                        );
                        reject_busy(stream);
                        continue;
                    };
                    let server = Arc::clone(&self);
                    let spawned = thread::Builder::new()
                        .name("reranker-conn".to_string())
                        .spawn(move || {
                            let _slot = slot;
                            if let Err(err) = server.handle_http_connection(stream) {
                                tracing::warn!(error = %err, "http request error");
                            }
                        });
                    if let Err(err) = spawned {
                        tracing::error!(error = %err, "failed to spawn connection thread");
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "http accept error");
                }
            }
        }
        Ok(())
    }

    fn handle_http_connection(&self, mut stream: TcpStream) -> io::Result<()> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let started = Instant::now();
        let Some(inbound) = read_http_request(&stream, self.max_body_bytes)? else {
            return Ok(());
        };

        let (method, path, response) = match inbound {
            Inbound::Request(req) => {
                let response = self.dispatch_http_request(&req);
                (req.method, req.path, response)
            }
            Inbound::TooLarge {
                method,
                path,
                content_length,
            } => {
                let response = HttpResponse::error(
                    413,
                    "payload_too_large",
                    format!(
                        "request body of {content_length} bytes exceeds limit of {} bytes",
                        self.max_body_bytes
                    ),
                );
                (method, path, response)
            }
            Inbound::HeadTooLarge => {
                let response = HttpResponse::error(
                    431,
                    "header_too_large",
                    format!("request head exceeds {MAX_HEAD_BYTES} bytes"),
                );
                ("-".to_string(), "-".to_string(), response)
            }
        };

        tracing::info!(
            method = %method,
            path = %path,
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "handled request"
        );
        write_http_response(&mut stream, &response)
    }

    pub fn dispatch_http_request(&self, req: &HttpRequest) -> HttpResponse {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/health") => HttpResponse::json(
                200,
                &json!({
                    "status": "ok",
                    "provider": self.service.scorer_name(),
                    "model": self.service.model(),
                }),
            ),
            ("POST", "/rerank") => self.handle_rerank(&req.body),
            (_, "/health" | "/rerank") => HttpResponse::error(
                405,
                "method_not_allowed",
                format!("{} is not supported on {}", req.method, req.path),
            ),
            _ => HttpResponse::error(404, "not_found", format!("no route for {}", req.path)),
        }
    }

    fn handle_rerank(&self, body: &[u8]) -> HttpResponse {
        let request: RerankRequest = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(err) => {
                return HttpResponse::error(400, "invalid_request", err.to_string());
            }
        };
        if let Some(id) = request.duplicate_id() {
            return HttpResponse::error(
                400,
                "duplicate_document_id",
                format!("document id {id:?} appears more than once"),
            );
        }

        match self.runtime.block_on(self.service.rerank(&request)) {
            Ok(response) => match serde_json::to_value(&response) {
                Ok(payload) => HttpResponse::json(200, &payload),
                Err(err) => HttpResponse::error(500, "internal_error", err.to_string()),
            },
            Err(err @ RerankError::Scoring(_)) => {
                HttpResponse::error(502, "scoring_error", err.to_string())
            }
            Err(err @ RerankError::InternalConsistency { .. }) => {
                HttpResponse::error(500, "internal_consistency_error", err.to_string())
            }
        }
    }
}

/// Answers 503 without reading the request, so a full server never blocks on
/// a slow client.
fn reject_busy(mut stream: TcpStream) {
    let response = HttpResponse::error(
        503,
        "server_busy",
        "too many concurrent connections, retry later",
    );
    if let Err(err) = write_http_response(&mut stream, &response) {
        tracing::debug!(error = %err, "failed to write busy response");
    }
    let _ = stream.shutdown(Shutdown::Write);
    drain_available(&stream);
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use reranker_scoring::{ScoringError, ScoringFunction};
    use serde_json::Value;

    use super::*;

    struct LengthScorer;

    #[async_trait]
    impl ScoringFunction for LengthScorer {
        fn name(&self) -> &'static str {
            "length"
        }

        fn model(&self) -> &str {
            "length-test"
        }

        async fn score_batch(
            &self,
            _query: &str,
            texts: &[String],
        ) -> Result<Vec<f32>, ScoringError> {
            Ok(texts.iter().map(|t| t.len() as f32).collect())
        }
    }

    fn server() -> RerankServer {
        RerankServer::new(RerankService::new(Arc::new(LengthScorer))).expect("server")
    }

    fn request(method: &str, path: &str, body: &str) -> HttpRequest {
        HttpRequest {
            method: method.to_string(),
            path: path.to_string(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn body(resp: &HttpResponse) -> Value {
        serde_json::from_slice(&resp.body).expect("json body")
    }

    #[test]
    fn connection_slots_are_bounded_and_released() {
        let counter = Arc::new(AtomicUsize::new(0));
        let first = ConnectionSlot::acquire(&counter, 2).expect("first slot");
        let second = ConnectionSlot::acquire(&counter, 2).expect("second slot");
        assert!(ConnectionSlot::acquire(&counter, 2).is_none());

        drop(first);
        assert_eq!(counter.load(Ordering::Acquire), 1);
        let third = ConnectionSlot::acquire(&counter, 2).expect("slot after release");
        drop((second, third));
        assert_eq!(counter.load(Ordering::Acquire), 0);
    }

    #[test]
    fn health_reports_scorer() {
        let resp = server().dispatch_http_request(&request("GET", "/health", ""));
        assert_eq!(resp.status, 200);
        assert_eq!(
            body(&resp),
            json!({"status":"ok","provider":"length","model":"length-test"})
        );
    }

    #[test]
    fn rerank_orders_by_score() {
        let payload = r#"{"query":"q","documents":[{"id":"short","text":"ab"},{"id":"long","text":"abcdef"}]}"#;
        let resp = server().dispatch_http_request(&request("POST", "/rerank", payload));
        assert_eq!(resp.status, 200);
        assert_eq!(
            body(&resp),
            json!({"results":[{"id":"long","score":6.0},{"id":"short","score":2.0}]})
        );
    }

    #[test]
    fn malformed_payload_is_client_error() {
        let resp = server().dispatch_http_request(&request("POST", "/rerank", r#"{"query":1}"#));
        assert_eq!(resp.status, 400);
        assert_eq!(body(&resp)["error"], "invalid_request");
    }

    #[test]
    fn duplicate_ids_are_client_error() {
        let payload = r#"{"query":"q","documents":[{"id":"a","text":"x"},{"id":"a","text":"y"}]}"#;
        let resp = server().dispatch_http_request(&request("POST", "/rerank", payload));
        assert_eq!(resp.status, 400);
        assert_eq!(body(&resp)["error"], "duplicate_document_id");
    }

    #[test]
    fn unknown_routes_and_methods() {
        let srv = server();
        assert_eq!(srv.dispatch_http_request(&request("GET", "/rerank", "")).status, 405);
        assert_eq!(srv.dispatch_http_request(&request("POST", "/health", "")).status, 405);
        assert_eq!(srv.dispatch_http_request(&request("GET", "/docs", "")).status, 404);
    }
}
