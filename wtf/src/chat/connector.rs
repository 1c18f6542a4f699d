use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::{Duration as StdDuration, Instant};

use async_trait::async_trait;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{routing::post, Router};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{WtfError, WtfResult};

pub const SECRET_HEADER: &str = "x-wtf-connector-secret";
pub const INBOUND_PATH: &str = "/connector/loopback/inbound";

/// One chat message as seen by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    pub id: String,
    pub channel_id: String,
    pub sender_id: String,
    pub text: String,
    pub timestamp: String,
}

/// A reply, posted as JSON to the bridge.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutboundRequest {
    pub channel_id: String,
    pub content: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SendResult {
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: String,
    /// Address actually bound, for connectors that listen.
    pub local_addr: Option<SocketAddr>,
}

pub type EnvelopeCallback = Arc<
    dyn Fn(MessageEnvelope) -> futures::future::BoxFuture<'static, WtfResult<()>> + Send + Sync,
>;

#[derive(Debug, Clone)]
pub struct LoopbackConnectorConfig {
    pub bind_addr: String,
    pub shared_secret: String,
    pub outbound_url: Option<String>,
    pub min_send_interval_ms: u64,
}

/// Transport between a chat network and the bot.
#[async_trait]
pub trait ChatConnector: Send + Sync {
    async fn connect(&self) -> WtfResult<ConnectionHandle>;
    async fn disconnect(&self, handle: &ConnectionHandle) -> WtfResult<()>;
    async fn subscribe(&self, handle: &ConnectionHandle, callback: EnvelopeCallback)
        -> WtfResult<()>;
    async fn send(&self, handle: &ConnectionHandle, outbound: OutboundRequest)
        -> WtfResult<SendResult>;
}

struct LoopbackConnectorState {
    shared_secret: String,
    callback: RwLock<Option<EnvelopeCallback>>,
}

struct RunningServer {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Webhook connector: a bridge process POSTs inbound messages to
/// [`INBOUND_PATH`] and receives our replies on `outbound_url`.
#[derive(Clone)]
pub struct LoopbackWebhookConnector {
    config: Arc<LoopbackConnectorConfig>,
    state: Arc<LoopbackConnectorState>,
    client: Client,
    server: Arc<Mutex<Option<RunningServer>>>,
    next_send_at: Arc<StdMutex<Option<Instant>>>,
}

impl LoopbackWebhookConnector {
    pub fn new(config: LoopbackConnectorConfig) -> Self {
        let state = LoopbackConnectorState {
            shared_secret: config.shared_secret.clone(),
            callback: RwLock::new(None),
        };
        Self {
            config: Arc::new(config),
            state: Arc::new(state),
            client: Client::new(),
            server: Arc::new(Mutex::new(None)),
            next_send_at: Arc::new(StdMutex::new(None)),
        }
    }

    fn router(&self) -> Router {
        Router::new()
            .route(INBOUND_PATH, post(inbound_handler))
            .with_state(self.state.clone())
    }

    async fn start_server(&self) -> WtfResult<SocketAddr> {
        let addr: SocketAddr = self
            .config
            .bind_addr
            .parse()
            .map_err(|_| WtfError::Connector(format!("invalid bind_addr {}", self.config.bind_addr)))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| WtfError::Connector(format!("failed to bind {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, self.router().into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
        let task = tokio::spawn(async move {
            if let Err(e) = server.await {
                warn!("loopback connector server stopped: {}", e);
            }
        });
        *self.server.lock().await = Some(RunningServer { shutdown, task });

        info!("loopback connector listening on {}", local_addr);
        Ok(local_addr)
    }

    /// Reserve the next send slot and return how long to wait for it.
    fn reserve_send_slot(&self) -> WtfResult<StdDuration> {
        let min_interval = StdDuration::from_millis(self.config.min_send_interval_ms);
        let mut next = self
            .next_send_at
            .lock()
            .map_err(|_| WtfError::LockPoisoned("rate limiter"))?;
        let now = Instant::now();
        let slot = next.filter(|at| *at > now).unwrap_or(now);
        *next = Some(slot + min_interval);
        Ok(slot.saturating_duration_since(now))
    }
}

#[async_trait]
impl ChatConnector for LoopbackWebhookConnector {
    async fn connect(&self) -> WtfResult<ConnectionHandle> {
        let local_addr = self.start_server().await?;
        Ok(ConnectionHandle {
            id: Uuid::new_v4().to_string(),
            local_addr: Some(local_addr),
        })
    }

    async fn disconnect(&self, _handle: &ConnectionHandle) -> WtfResult<()> {
        if let Some(running) = self.server.lock().await.take() {
            let _ = running.shutdown.send(());
            let _ = running.task.await;
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        _handle: &ConnectionHandle,
        callback: EnvelopeCallback,
    ) -> WtfResult<()> {
        *self.state.callback.write().await = Some(callback);
        Ok(())
    }

    async fn send(
        &self,
        _handle: &ConnectionHandle,
        outbound: OutboundRequest,
    ) -> WtfResult<SendResult> {
        let Some(outbound_url) = &self.config.outbound_url else {
            return Err(WtfError::Connector("outbound URL not configured".to_string()));
        };

        let wait = self.reserve_send_slot()?;
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        let resp = self
            .client
            .post(outbound_url)
            .json(&outbound)
            .send()
            .await
            .map_err(|e| WtfError::Connector(format!("outbound send failed: {}", e)))?;

        let status = resp.status();
        Ok(SendResult {
            success: status.is_success(),
            error: (!status.is_success()).then(|| format!("outbound returned status {}", status)),
        })
    }
}

#[derive(Debug, Deserialize)]
struct InboundPayload {
    channel_id: String,
    sender_id: String,
    text: String,
    message_id: Option<String>,
    timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
struct InboundResponse {
    accepted: bool,
    message_id: Option<String>,
    error: Option<String>,
}

impl InboundResponse {
    fn rejected(status: StatusCode, error: &str) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                accepted: false,
                message_id: None,
                error: Some(error.to_string()),
            }),
        )
    }
}

async fn inbound_handler(
    State(state): State<Arc<LoopbackConnectorState>>,
    headers: HeaderMap,
    Json(payload): Json<InboundPayload>,
) -> (StatusCode, Json<InboundResponse>) {
    let secret = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if secret != Some(state.shared_secret.as_str()) {
        warn!("rejected inbound message with bad connector secret");
        return InboundResponse::rejected(StatusCode::UNAUTHORIZED, "unauthorized");
    }

    let envelope = MessageEnvelope {
        id: payload
            .message_id
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        channel_id: payload.channel_id,
        sender_id: payload.sender_id,
        text: payload.text,
        timestamp: payload
            .timestamp
            .unwrap_or_else(|| Utc::now().to_rfc3339()),
    };
    let message_id = envelope.id.clone();

    let callback = state.callback.read().await.clone();
    if let Some(callback) = callback {
        if let Err(e) = callback(envelope).await {
            warn!("inbound message {} failed: {}", message_id, e);
            return InboundResponse::rejected(StatusCode::INTERNAL_SERVER_ERROR, "callback error");
        }
    }

    (
        StatusCode::OK,
        Json(InboundResponse {
            accepted: true,
            message_id: Some(message_id),
            error: None,
        }),
    )
}
