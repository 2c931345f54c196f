//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all relay handler
//! - Wire up middleware (request ID, tracing)
//! - Bound the wait for the upstream head (`timeouts.request_secs`, 504)
//! - Bind server to listener and drain on shutdown
//! - Run each forwarding call as its own task, tied to the client response
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::client::ClientRegistry;
use crate::config::RelayConfig;
use crate::http::request::{request_id, upstream_url, PeerInfo};
use crate::http::response::error_response;
use crate::http::sink;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::proxy::{ExchangePhase, Forwarder, InboundContext, ProxyError, ProxyOptions};

/// Body chunks buffered between the forwarding task and the client.
const BODY_CHANNEL_CAPACITY: usize = 16;

/// Application state injected into handlers.
#[derive(Debug)]
struct RelayState {
    forwarder: Forwarder,
    options: ProxyOptions,
    target: String,
    head_timeout: Duration,
}

/// HTTP server that relays every request to one upstream.
pub struct HttpServer {
    config: RelayConfig,
    forwarder: Forwarder,
    options: ProxyOptions,
}

impl HttpServer {
    /// Create a server whose client profiles and options come from `config`.
    pub fn new(config: RelayConfig) -> Self {
        let forwarder = Forwarder::new(ClientRegistry::from_profiles(&config.clients));
        let options = ProxyOptions::new()
            .with_forwarded_headers(config.forwarding.add_forwarded_headers)
            .with_client_name(config.forwarding.client.clone());
        Self {
            config,
            forwarder,
            options,
        }
    }

    /// Replace the forwarding options, e.g. to install hooks.
    pub fn with_options(mut self, options: ProxyOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the forwarder (and with it the client registry).
    pub fn with_forwarder(mut self, forwarder: Forwarder) -> Self {
        self.forwarder = forwarder;
        self
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        let state = Arc::new(RelayState {
            forwarder: self.forwarder.clone(),
            options: self.options.clone(),
            target: self.config.upstream.target.clone(),
            head_timeout: Duration::from_secs(self.config.timeouts.request_secs),
        });

        Router::new()
            .route("/{*path}", any(relay_handler))
            .route("/", any(relay_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.target,
            "HTTP server starting"
        );

        let app = self
            .router()
            .into_make_service_with_connect_info::<PeerInfo>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Relays one request. Returns as soon as the upstream head is committed; the
/// body keeps streaming from the forwarding task.
async fn relay_handler(
    State(state): State<Arc<RelayState>>,
    ConnectInfo(peer): ConnectInfo<PeerInfo>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let request_id = request_id(request.headers()).to_string();
    let target = upstream_url(&state.target, request.uri());

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        target = %target,
        remote = %peer.remote,
        "Relaying request"
    );

    // Dropping the guard (handler aborted, or client body dropped) cancels
    // the forwarding task.
    let cancellation = CancellationToken::new();
    let guard = cancellation.clone().drop_guard();
    let (sink, mut pending) = sink::channel(BODY_CHANNEL_CAPACITY);
    let mut ctx = InboundContext::new(request, peer.connection(), Box::new(sink))
        .with_cancellation(cancellation);

    let task_state = state.clone();
    let task_target = target.clone();
    let task_request_id = request_id.clone();
    let forwarding = tokio::spawn(async move {
        let result = task_state
            .forwarder
            .forward(&mut ctx, &task_target, &task_state.options)
            .await;
        if let Err(e) = &result {
            metrics::record_error(e.kind());
            tracing::warn!(
                request_id = %task_request_id,
                target = %task_target,
                kind = e.kind(),
                error = %e,
                "Forwarding failed"
            );
        }
        result
    });

    let head = match tokio::time::timeout(state.head_timeout, &mut pending.head).await {
        Ok(head) => head.ok(),
        Err(_) => {
            // Dropping the guard cancels the forwarding task.
            drop(guard);
            tracing::warn!(
                request_id = %request_id,
                target = %target,
                timeout = ?state.head_timeout,
                "Upstream response head deadline exceeded"
            );
            let response = error_response(&ProxyError::UpstreamTimeout {
                phase: ExchangePhase::Dispatch,
            });
            metrics::record_request(method.as_str(), response.status().as_u16(), start);
            return response;
        }
    };

    if let Some(head) = head {
        metrics::record_request(method.as_str(), head.status.as_u16(), start);
        tracing::info!(
            request_id = %request_id,
            method = %method,
            target = %target,
            status = %head.status,
            "Relayed response"
        );
        return pending.into_response(head, guard);
    }

    // The sink went away without a head: the task is done.
    let response = match forwarding.await {
        Ok(Err(e)) => error_response(&e),
        Ok(Ok(())) => (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response(),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Forwarding task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    };
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    drop(guard);
    response
}
