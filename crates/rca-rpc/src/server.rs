// crates/rca-rpc/src/server.rs
//
// RPC server setup: RcaRpcServer and RpcConfig.
//
// A single tonic unary service accepts JSON-encoded requests with a method
// field, dispatches to the matching handler, and returns JSON-encoded
// responses. Transport, HTTP/1 acceptance and interceptors come from tonic;
// no proto codegen is involved.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tonic::transport::Server;
use tonic::Status;

use rca_core::IncidentStore;
use rca_pipeline::{RcaGate, WatcherState};

use crate::handlers;
use crate::middleware;

/// Path clients POST JSON-RPC envelopes to.
pub const RPC_PATH: &str = "/rca.rpc.RcaService/Call";

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50061,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC-style request envelope.
/// The client sends a method name and a JSON params payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// The RPC method to invoke (e.g., "rca/generate", "incident/submit").
    pub method: String,
    /// JSON-encoded parameters for the method.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A JSON-RPC-style response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub success: bool,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl JsonRpcResponse {
    fn ok(value: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(value),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message),
        }
    }
}

// ---------------------------------------------------------------------------
// RcaRpcServer
// ---------------------------------------------------------------------------

/// The RPC server for the RCA generation service.
///
/// Shares the gate (and through it the provider and report store) with the
/// watcher, so API and watcher generations go through the same path.
#[derive(Clone)]
pub struct RcaRpcServer {
    config: RpcConfig,
    service: RcaServiceImpl,
}

impl std::fmt::Debug for RcaRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RcaRpcServer")
            .field("config", &self.config)
            .field("provider", &self.service.gate.provider_name())
            .finish()
    }
}

impl RcaRpcServer {
    pub fn new(config: RpcConfig, gate: RcaGate, incidents: Arc<dyn IncidentStore>) -> Self {
        Self {
            config,
            service: RcaServiceImpl {
                gate,
                incidents,
                start_time: Instant::now(),
                watcher_state: None,
            },
        }
    }

    /// Set the daemon start time for uptime reporting.
    pub fn with_start_time(mut self, start_time: Instant) -> Self {
        self.service.start_time = start_time;
        self
    }

    /// Report the watcher's state on `node/health`.
    pub fn with_watcher_state(mut self, state: watch::Receiver<WatcherState>) -> Self {
        self.service.watcher_state = Some(state);
        self
    }

    /// Dispatch one request in-process, without the transport.
    pub async fn handle(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        self.service.dispatch(request).await
    }

    /// Start the RPC server and serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()>,
    {
        let addr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        tracing::info!("RCA RPC server starting on {}", addr);

        Server::builder()
            .accept_http1(true)
            .add_service(tonic::service::interceptor::InterceptedService::new(
                RcaJsonRpcServer::new(self.service.clone()),
                middleware::logging_interceptor,
            ))
            .serve_with_shutdown(addr, shutdown)
            .await?;

        tracing::info!("RCA RPC server stopped");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Shared state behind the service; cheap to clone per request.
#[derive(Clone)]
struct RcaServiceImpl {
    gate: RcaGate,
    incidents: Arc<dyn IncidentStore>,
    start_time: Instant,
    watcher_state: Option<watch::Receiver<WatcherState>>,
}

impl RcaServiceImpl {
    /// Dispatch a JSON-RPC request to the appropriate handler based on the method name.
    async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let result = match request.method.as_str() {
            // RCA
            "rca/generate" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::rca::handle_generate_rca(&self.gate, self.incidents.as_ref(), r).await
                })
                .await
            }
            "rca/get" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::rca::handle_get_rca(&self.gate, r).await
                })
                .await
            }
            "rca/close" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::rca::handle_close_rca(&self.gate, r).await
                })
                .await
            }

            // Incidents
            "incident/submit" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::incident::handle_submit_incident(self.incidents.as_ref(), r).await
                })
                .await
            }
            "incident/get" => {
                dispatch_handler(request.params, |r| async move {
                    handlers::incident::handle_get_incident(self.incidents.as_ref(), r).await
                })
                .await
            }

            // Node
            "node/health" => {
                let uptime_secs = self.start_time.elapsed().as_secs();
                let watcher = self.watcher_state.as_ref().map(|rx| *rx.borrow());
                let provider = self.gate.provider_name().to_string();
                dispatch_handler(request.params, |r| async move {
                    handlers::node::handle_get_health(r, &provider, uptime_secs, watcher).await
                })
                .await
            }

            _ => Err(format!("Unknown method: {}", request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::ok(value),
            Err(err) => JsonRpcResponse::err(err),
        }
    }
}

/// Generic dispatch helper: deserialize params into a request type,
/// call the handler, and serialize the result to JSON.
async fn dispatch_handler<Req, Resp, F, Fut>(
    params: serde_json::Value,
    handler: F,
) -> Result<serde_json::Value, String>
where
    Req: serde::de::DeserializeOwned,
    Resp: serde::Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: Future<Output = Result<Resp, String>>,
{
    // Parameterless methods accept a missing `params`.
    let params = if params.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        params
    };
    let request: Req = serde_json::from_value(params)
        .map_err(|e| format!("Failed to deserialize request: {}", e))?;
    let response = handler(request).await?;
    serde_json::to_value(response).map_err(|e| format!("Failed to serialize response: {}", e))
}

// ---------------------------------------------------------------------------
// Tonic Service Wiring
// ---------------------------------------------------------------------------
// One service with one method, `Call`. Request and response bodies are the
// JSON-encoded envelopes.

#[derive(Clone)]
pub struct RcaJsonRpcServer {
    inner: RcaServiceImpl,
}

impl std::fmt::Debug for RcaJsonRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RcaJsonRpcServer").finish()
    }
}

impl RcaJsonRpcServer {
    fn new(inner: RcaServiceImpl) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for RcaJsonRpcServer {
    const NAME: &'static str = "rca.rpc.RcaService";
}

impl<B> tower_service::Service<http::Request<B>> for RcaJsonRpcServer
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    B::Data: Send,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let body_bytes = match collect_body(req.into_body()).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::error!("Failed to read request body: {}", e);
                    let resp = JsonRpcResponse::err(format!("Failed to read request body: {}", e));
                    return Ok(build_response(&resp));
                }
            };

            let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body_bytes) {
                Ok(r) => r,
                Err(e) => {
                    let resp = JsonRpcResponse::err(format!("Invalid JSON-RPC request: {}", e));
                    return Ok(build_response(&resp));
                }
            };

            let method = rpc_request.method.clone();
            let started = Instant::now();
            let rpc_response = inner.dispatch(rpc_request).await;
            tracing::info!(
                "RPC {} -> {} in {:?}",
                method,
                if rpc_response.success { "ok" } else { "error" },
                started.elapsed()
            );
            Ok(build_response(&rpc_response))
        })
    }
}

/// Collect the body of an HTTP request into bytes.
async fn collect_body<B>(body: B) -> Result<Vec<u8>, String>
where
    B: HttpBody + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    B::Data: Send,
{
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    loop {
        match std::future::poll_fn(|cx| HttpBody::poll_frame(body.as_mut(), cx)).await {
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    use bytes::Buf;
                    collected.extend_from_slice(data.chunk());
                }
            }
            Some(Err(e)) => return Err(e.into().to_string()),
            None => break,
        }
    }

    Ok(collected)
}

/// Build a 200 response carrying the JSON envelope.
fn build_response(envelope: &JsonRpcResponse) -> http::Response<tonic::body::BoxBody> {
    let json = serde_json::to_vec(envelope).unwrap_or_default();
    let body = tonic::body::BoxBody::new(
        http_body_util::Full::new(bytes::Bytes::from(json))
            .map_err(|e| Status::internal(format!("body error: {}", e))),
    );

    let mut response = http::Response::new(body);
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}
