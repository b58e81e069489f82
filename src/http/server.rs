//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the single catch-all handler
//! - Wire up middleware (tracing)
//! - Ask the RuleSet where each request goes
//! - Forward proxied requests (plain HTTP or WebSocket tunnel)
//! - Serve everything else from the public directory
//!
//! # Design Decisions
//! - The upstream wait is bounded by `timeouts.request_secs`; expiry is a
//!   transport failure (500, `ETIMEDOUT`), not a bare 408
//! - Upgraded tunnels outlive the HTTP server, so they get their own close signal

use axum::{
    body::{Body, HttpBody},
    extract::{ConnectInfo, State},
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::DevServerConfig;
use crate::http::forward::{forward_headers, strip_hop_by_hop, upstream_url, Upstream};
use crate::http::response::ProxyFailure;
use crate::http::websocket::{is_upgrade_request, switch_protocols};
use crate::observability::metrics;
use crate::routing::{RoutingRule, RuleSet};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub rules: Option<Arc<RuleSet>>,
    pub upstream: Arc<Upstream>,
    pub static_files: ServeDir<ServeFile>,
    pub max_body_size: usize,
    pub upstream_timeout: Duration,
    /// Fired on shutdown; every WebSocket tunnel listens.
    pub tunnels: broadcast::Sender<()>,
}

/// Development server: static files plus the proxy.
pub struct DevServer {
    router: Router,
    config: DevServerConfig,
    tunnels: broadcast::Sender<()>,
}

impl DevServer {
    /// Create a server. `rules == None` serves static files only.
    pub fn new(config: DevServerConfig, rules: Option<RuleSet>) -> Result<Self, reqwest::Error> {
        let agent = rules.as_ref().and_then(|r| r.agent());
        let upstream = Arc::new(Upstream::new(agent, &config.timeouts)?);

        let public_dir = rules
            .as_ref()
            .map(|r| r.public_root().to_path_buf())
            .unwrap_or_else(|| config.public_dir.clone());
        let static_files = ServeDir::new(&public_dir)
            .fallback(ServeFile::new(public_dir.join("index.html")));

        let (tunnels, _) = broadcast::channel(1);
        let state = AppState {
            rules: rules.map(Arc::new),
            upstream,
            static_files,
            max_body_size: config.limits.max_body_size,
            upstream_timeout: Duration::from_secs(config.timeouts.request_secs),
            tunnels: tunnels.clone(),
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            tunnels,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dev_handler))
            .route("/", any(dev_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            public_dir = %self.config.public_dir.display(),
            "Dev server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let tunnels = self.tunnels;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                let _ = tunnels.send(());
            })
            .await?;

        tracing::info!("Dev server stopped");
        Ok(())
    }

    pub fn config(&self) -> &DevServerConfig {
        &self.config
    }
}

/// Catch-all handler: decide, then forward or serve locally.
async fn dev_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let rule = match &state.rules {
        Some(rules) => {
            let method = request.method().clone();
            let path = request.uri().path().to_string();
            decide(Arc::clone(rules), method, path).await
        }
        None => None,
    };
    metrics::record_decision(rule.is_some());

    match rule {
        Some(rule) => proxy_request(&state, &rule, addr, request).await,
        None => serve_local(&state, request).await,
    }
}

/// Route on the blocking pool; the existence check touches the disk.
async fn decide(rules: Arc<RuleSet>, method: Method, path: String) -> Option<RoutingRule> {
    let decided = tokio::task::spawn_blocking(move || {
        let rule = rules.route(&method, &path).rule().cloned();
        tracing::debug!(method = %method, path = %path, proxied = rule.is_some(), "Routing decision");
        rule
    })
    .await;

    match decided {
        Ok(rule) => rule,
        Err(e) => {
            tracing::error!(error = %e, "Routing task failed, serving locally");
            None
        }
    }
}

async fn serve_local(state: &AppState, request: Request<Body>) -> Response {
    match state.static_files.clone().oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

async fn proxy_request(
    state: &AppState,
    rule: &RoutingRule,
    client_addr: SocketAddr,
    mut request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let upgrade = is_upgrade_request(request.headers());
    let on_upgrade = upgrade.then(|| hyper::upgrade::on(&mut request));

    let (parts, body) = request.into_parts();
    let url = upstream_url(&rule.target, &parts.uri);
    let headers = forward_headers(&parts.headers, rule, client_addr, upgrade);

    tracing::debug!(
        method = %parts.method,
        path = %parts.uri.path(),
        upstream = %url,
        use_agent = rule.use_agent,
        upgrade,
        "Forwarding request"
    );

    let mut outbound = state
        .upstream
        .client_for(rule)
        .request(parts.method.clone(), url)
        .headers(headers);
    if needs_body(upgrade, &body) {
        match axum::body::to_bytes(body, state.max_body_size).await {
            Ok(bytes) => outbound = outbound.body(bytes),
            Err(e) => {
                tracing::warn!(path = %parts.uri.path(), error = %e, "Request body rejected");
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
            }
        }
    }

    let response = match tokio::time::timeout(state.upstream_timeout, outbound.send()).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            let failure = ProxyFailure::from_error(&parts, rule, &e);
            failure.log(&e);
            metrics::record_proxy_error(failure.code);
            return failure.into_response();
        }
        Err(elapsed) => {
            let failure = ProxyFailure::new(&parts, rule, "ETIMEDOUT");
            failure.log(&elapsed);
            metrics::record_proxy_error(failure.code);
            return failure.into_response();
        }
    };
    metrics::record_upstream(&rule.context_prefix, start);

    match on_upgrade {
        Some(on_upgrade) if response.status() == StatusCode::SWITCHING_PROTOCOLS => {
            let closed = state.tunnels.subscribe();
            switch_protocols(on_upgrade, response, parts.uri.path().to_string(), closed)
        }
        _ => relay_response(response),
    }
}

/// Whether the request carries a body to forward.
///
/// Asks the body itself; HTTP/2 bodies need neither `Content-Length` nor
/// `Transfer-Encoding`.
fn needs_body(upgrade: bool, body: &Body) -> bool {
    !upgrade && !body.is_end_stream()
}

/// Stream the upstream response back to the client.
fn relay_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
