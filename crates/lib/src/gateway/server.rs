//! Gateway HTTP server (single port): verification handshake, event callbacks, health.

use crate::channels::{inbound_events, InboundEvent, MessengerChannel, WebhookBody};
use crate::config::{self, Config};
use crate::dispatch::Dispatcher;
use crate::gateway::protocol::VerifyParams;
use crate::gateway::signature::verify_signature;
use crate::session::{spawn_expiry_sweep, ConversationStore};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Acknowledgement body Messenger expects for a delivered callback.
const EVENT_RECEIVED: &str = "EVENT_RECEIVED";

const INBOUND_QUEUE: usize = 256;

const MODE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

/// Shared state for the gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// Expected `hub.verify_token`; None rejects every handshake.
    pub verify_token: Option<String>,
    /// When Some, POST bodies must carry a valid X-Hub-Signature-256.
    pub app_secret: Option<String>,
    /// Sender for parsed events. The processor task receives and dispatches them.
    pub inbound_tx: mpsc::Sender<InboundEvent>,
}

impl GatewayState {
    pub fn new(config: Arc<Config>, inbound_tx: mpsc::Sender<InboundEvent>) -> Self {
        Self {
            verify_token: config::resolve_verify_token(&config),
            app_secret: config::resolve_app_secret(&config),
            config,
            inbound_tx,
        }
    }
}

/// Router for the gateway endpoints.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(verify_webhook).post(receive_webhook))
        .route("/health", get(health_http))
        .with_state(state)
}

/// Spawn the task that takes events off the queue and handles each on its own task, so a slow
/// delegate call for one sender never holds up another.
///
/// Events of one sender run in queue order: each task first waits for the sender's previous
/// task. When the queue closes, the processor waits for every outstanding task.
pub fn spawn_event_processor(
    dispatcher: Arc<Dispatcher>,
    mut inbound_rx: mpsc::Receiver<InboundEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_by_sender: HashMap<String, JoinHandle<()>> = HashMap::new();
        while let Some(event) = inbound_rx.recv().await {
            last_by_sender.retain(|_, task| !task.is_finished());
            let previous = last_by_sender.remove(&event.sender_id);
            let sender_id = event.sender_id.clone();
            let dispatcher = dispatcher.clone();
            let task = tokio::spawn(async move {
                if let Some(previous) = previous {
                    let _ = previous.await;
                }
                dispatcher.handle(event).await;
            });
            last_by_sender.insert(sender_id, task);
        }
        log::debug!(
            "event processor: inbound queue closed, waiting for {} sender(s)",
            last_by_sender.len()
        );
        for (_, task) in last_by_sender {
            let _ = task.await;
        }
    })
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// When bind is not loopback, both a verify token and an app secret must be configured.
/// Blocks until shutdown (Ctrl+C or SIGTERM).
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind = config.gateway.bind.trim().to_string();
    if !config::is_loopback_bind(&bind)
        && (config::resolve_verify_token(&config).is_none()
            || config::resolve_app_secret(&config).is_none())
    {
        anyhow::bail!(
            "refusing to bind gateway to {} without webhook auth (set messenger.verifyToken and messenger.appSecret, or VERIFY_TOKEN and APP_SECRET)",
            bind
        );
    }

    let page_token = config::resolve_page_access_token(&config);
    if page_token.is_none() {
        log::error!("PAGE_ACCESS_TOKEN is not set; replies will be skipped");
    }
    if config::resolve_verify_token(&config).is_none() {
        log::warn!("verify token is not set; webhook verification requests will be rejected");
    }

    let modes = Arc::new(ConversationStore::with_ttl_secs(
        config.conversation.mode_ttl_secs,
    ));
    let sweep = spawn_expiry_sweep(modes.clone(), MODE_SWEEP_INTERVAL);
    let outbound = Arc::new(MessengerChannel::new(
        page_token,
        config.messenger.send_api_url.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::from_config(&config, modes, outbound));

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE);
    let processor = spawn_event_processor(dispatcher, inbound_rx);

    let port = config.gateway.port;
    let state = GatewayState::new(Arc::new(config), inbound_tx);
    let app = router(state);

    let bind_addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;

    sweep.abort();
    // The router (and its queue sender) is gone, so the processor drains and exits.
    if tokio::time::timeout(SHUTDOWN_GRACE, processor).await.is_err() {
        log::warn!("event processor did not finish within {:?}", SHUTDOWN_GRACE);
    }
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET /: verification handshake. Echo hub.challenge when hub.verify_token matches.
async fn verify_webhook(
    State(state): State<GatewayState>,
    Query(params): Query<VerifyParams>,
) -> (StatusCode, String) {
    log::info!("verify request: mode={:?}", params.mode);
    match params.accepted_challenge(state.verify_token.as_deref()) {
        Some(challenge) => (StatusCode::OK, challenge.to_string()),
        None => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
    }
}

/// POST /: event callback. Checks the signature when an app secret is set, queues every
/// user event in the body and acknowledges immediately.
async fn receive_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    if let Some(ref secret) = state.app_secret {
        let provided = headers
            .get("X-Hub-Signature-256")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify_signature(&body, provided, secret) {
            log::warn!("webhook: rejected body with bad or missing signature");
            return (StatusCode::FORBIDDEN, "Forbidden");
        }
    }
    let parsed: WebhookBody = match serde_json::from_slice(&body) {
        Ok(b) => b,
        Err(e) => {
            log::warn!("webhook: unparseable body: {}", e);
            return (StatusCode::BAD_REQUEST, "Bad Request");
        }
    };
    let events = inbound_events(&parsed, &state.config.conversation.image_trigger_payload);
    log::info!(
        "webhook: {} event(s) received (object {:?})",
        events.len(),
        parsed.object
    );
    for event in events {
        if state.inbound_tx.send(event).await.is_err() {
            log::error!("webhook: event processor is gone");
            return (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable");
        }
    }
    (StatusCode::OK, EVENT_RECEIVED)
}

/// GET /health returns a simple health JSON (for liveness checks).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}
