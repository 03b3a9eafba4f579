//! Webhook server for the telephony channel.
//!
//! # Responsibilities
//! - Create the Axum router with the webhook and health handlers
//! - Wire up middleware (tracing, body limit, timeout)
//! - Verify provider signatures before anything else
//! - Hand accepted requests to the dispatcher on a detached task

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::blockchain::ChainClient;
use crate::config::WebhookConfig;
use crate::dispatch::Dispatcher;
use crate::http::signature::{SignatureVerifier, SIGNATURE_HEADER};
use crate::routing::Channel;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub chain: Arc<dyn ChainClient>,
    /// `None` when signature verification is disabled.
    pub verifier: Option<Arc<SignatureVerifier>>,
}

/// HTTP server receiving inbound messages from the telephony provider.
pub struct WebhookServer {
    router: Router,
    config: WebhookConfig,
}

impl WebhookServer {
    /// Create a new webhook server.
    pub fn new(config: WebhookConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &WebhookConfig, state: AppState) -> Router {
        Router::new()
            .route(&config.path, post(webhook_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// The assembled router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, path = %self.config.path, "Webhook server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Webhook server stopped");
        Ok(())
    }
}

/// Inbound message handler.
///
/// Answers as soon as the request is handed off; the reply to the sender
/// goes out through the telephony API, not this response.
async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let params: Vec<(String, String)> = url::form_urlencoded::parse(&body)
        .into_owned()
        .collect();

    if let Some(verifier) = &state.verifier {
        let provided = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verifier.verify(provided, &params) {
            tracing::warn!("Rejected webhook with invalid signature");
            return StatusCode::FORBIDDEN;
        }
    }

    let field = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    let (Some(sender), Some(text)) = (field("From"), field("Body")) else {
        tracing::warn!("Webhook missing From or Body");
        return StatusCode::BAD_REQUEST;
    };

    drop(state.dispatcher.spawn(sender, text, Channel::Webhook));
    StatusCode::NO_CONTENT
}

/// Liveness of the gateway's chain connectivity.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.chain.is_healthy().await {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "chain unreachable")
    }
}
