//! HTTP host for the agent catalog
//!
//! Every agent is reachable at `POST /agents/{id}`. Responses are always
//! `200` once an agent is found, failures included, so callers only ever see
//! the agent's own output or the fixed failure text. Operational endpoints
//! (`/health`, `/ready`, `/live`, `/metrics`) sit alongside.

use crate::agents::{AgentCatalog, AgentInfo};
use crate::llm::registry::ProviderRegistry;
use crate::observability::metrics::metrics;
use bytes::Bytes;
use serde::Serialize;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Largest request body an agent accepts.
///
/// The cap is enforced from the `Content-Length` header, so agent requests
/// must declare one. Chunked uploads without it are answered with `411
/// Length Required` before any agent runs.
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Server startup errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen address {0}")]
    InvalidAddress(String),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: warp::Error,
    },
}

/// Serves the agent catalog and operational endpoints
#[derive(Clone)]
pub struct AgentServer {
    catalog: Arc<AgentCatalog>,
    registry: Arc<ProviderRegistry>,
}

impl AgentServer {
    pub fn new(catalog: AgentCatalog, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            registry,
        }
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.catalog
    }

    /// Every route, ready for `warp::serve` or `warp::test`
    pub fn routes(&self) -> impl Filter<Extract = (Response,), Error = Infallible> + Clone {
        let invoke = warp::path!("agents" / String)
            .and(warp::post())
            .and(warp::body::content_length_limit(MAX_BODY_BYTES))
            .and(warp::body::bytes())
            .and(with_state(self.catalog.clone()))
            .then(invoke_agent);

        let welcome = warp::path!("agents" / String / "welcome")
            .or(warp::path!("agents" / String))
            .unify()
            .and(warp::get())
            .and(with_state(self.catalog.clone()))
            .then(agent_welcome);

        let list = warp::path!("agents")
            .and(warp::get())
            .and(with_state(self.catalog.clone()))
            .then(list_agents);

        let health = warp::path!("health")
            .and(warp::get())
            .and(with_state(self.catalog.clone()))
            .and(with_state(self.registry.clone()))
            .then(health_status);

        let ready = warp::path!("ready")
            .and(warp::get())
            .and(with_state(self.registry.clone()))
            .then(readiness);

        let live = warp::path!("live").and(warp::get()).map(|| {
            warp::reply::json(&LivenessResponse {
                alive: true,
                timestamp: current_timestamp(),
            })
            .into_response()
        });

        let metrics_route = warp::path!("metrics")
            .and(warp::get())
            .map(|| warp::reply::json(&metrics().get_metrics()).into_response());

        let root = warp::path::end()
            .and(warp::get())
            .map(|| warp::reply::json(&api_documentation()).into_response());

        invoke
            .or(welcome)
            .unify()
            .or(list)
            .unify()
            .or(health)
            .unify()
            .or(ready)
            .unify()
            .or(live)
            .unify()
            .or(metrics_route)
            .unify()
            .or(root)
            .unify()
            .with(warp::cors().allow_any_origin())
            .map(|reply| Reply::into_response(reply))
            .recover(handle_rejection)
            .unify()
    }

    /// Serve until `shutdown` resolves
    pub async fn run(
        self,
        host: &str,
        port: u16,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let ip: IpAddr = host
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{host}:{port}")))?;
        let addr = SocketAddr::new(ip, port);

        let (bound, server) = warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .map_err(|source| ServerError::Bind { addr, source })?;

        info!(
            "Serving {} agents on http://{}",
            self.catalog.len(),
            bound
        );
        server.await;
        info!("HTTP server stopped");
        Ok(())
    }
}

fn with_state<T: Clone + Send + Sync>(state: T) -> impl Filter<Extract = (T,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn invoke_agent(agent_id: String, body: Bytes, catalog: Arc<AgentCatalog>) -> Response {
    let Some(handler) = catalog.get(&agent_id) else {
        return unknown_agent(&agent_id);
    };

    debug!(agent = %agent_id, bytes = body.len(), "Agent request received");
    let response = handler.handle(&body).await;

    warp::reply::with_header(response.body(), "content-type", response.content_type())
        .into_response()
}

async fn agent_welcome(agent_id: String, catalog: Arc<AgentCatalog>) -> Response {
    match catalog.get(&agent_id) {
        Some(handler) => warp::reply::json(&handler.welcome()).into_response(),
        None => unknown_agent(&agent_id),
    }
}

async fn list_agents(catalog: Arc<AgentCatalog>) -> Response {
    warp::reply::json(&catalog.list()).into_response()
}

async fn health_status(catalog: Arc<AgentCatalog>, registry: Arc<ProviderRegistry>) -> Response {
    let status = HealthStatus {
        status: "healthy",
        timestamp: current_timestamp(),
        uptime_seconds: metrics().get_metrics().uptime_seconds,
        agents: catalog.list(),
        providers: registry.names(),
    };
    warp::reply::json(&status).into_response()
}

async fn readiness(registry: Arc<ProviderRegistry>) -> Response {
    let mut providers = BTreeMap::new();
    for (name, result) in registry.health_check_all().await {
        let status = match result {
            Ok(()) => "healthy".to_string(),
            Err(e) => {
                warn!("Provider {} failed its health check: {}", name, e);
                format!("unhealthy: {e}")
            }
        };
        providers.insert(name, status);
    }

    let ready = !providers.is_empty() && providers.values().all(|s| s == "healthy");
    let response = ReadinessResponse {
        ready,
        timestamp: current_timestamp(),
        providers,
    };
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    warp::reply::with_status(warp::reply::json(&response), status).into_response()
}

fn unknown_agent(agent_id: &str) -> Response {
    error_reply(StatusCode::NOT_FOUND, format!("Unknown agent: {agent_id}"))
}

fn error_reply(status: StatusCode, error: String) -> Response {
    let body = ErrorResponse {
        error,
        timestamp: current_timestamp(),
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Request body exceeds {MAX_BODY_BYTES} bytes"),
        )
    } else if rejection.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            "Content-Length header is required".to_string(),
        )
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        warn!("Unhandled rejection: {:?}", rejection);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(error_reply(status, message))
}

fn api_documentation() -> ApiDocumentationResponse {
    let endpoints = [
        ("POST /agents/{id}", "Run one agent request"),
        ("GET /agents/{id}", "Agent welcome message and example prompts"),
        ("GET /agents/{id}/welcome", "Agent welcome message and example prompts"),
        ("GET /agents", "List available agents"),
        ("GET /health", "Service status, agents and configured providers"),
        ("GET /ready", "Readiness probe backed by provider health checks"),
        ("GET /live", "Liveness probe"),
        ("GET /metrics", "Request and generation metrics"),
    ]
    .into_iter()
    .map(|(route, description)| (route.to_string(), description.to_string()))
    .collect();

    ApiDocumentationResponse { endpoints }
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    timestamp: u64,
    uptime_seconds: u64,
    agents: Vec<AgentInfo>,
    providers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    ready: bool,
    timestamp: u64,
    providers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct LivenessResponse {
    alive: bool,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct ApiDocumentationResponse {
    endpoints: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    timestamp: u64,
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
