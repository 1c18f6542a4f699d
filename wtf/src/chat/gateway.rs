use std::net::SocketAddr;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::config::WtfConfig;
use crate::error::{WtfError, WtfResult};
use crate::interpreter::Interpreter;
use crate::store::SqliteGlossary;

use super::connector::{
    ChatConnector, ConnectionHandle, EnvelopeCallback, LoopbackConnectorConfig,
    LoopbackWebhookConnector, MessageEnvelope, OutboundRequest, SendResult,
};

/// Who the bot is and where it listens.
#[derive(Debug, Clone, Default)]
pub struct GatewayIdentity {
    pub nick: String,
    /// Channels the bot answers in. Empty admits every channel.
    pub rooms: Vec<String>,
}

/// Routes chat messages between a [`ChatConnector`] and the [`Interpreter`].
#[derive(Clone)]
pub struct WtfGateway {
    state: Arc<GatewayState>,
}

struct GatewayState {
    interpreter: Arc<Interpreter>,
    connector: Arc<dyn ChatConnector>,
    handle: ConnectionHandle,
    identity: GatewayIdentity,
}

impl WtfGateway {
    /// Connect `connector` and start answering its messages.
    pub async fn attach(
        interpreter: Arc<Interpreter>,
        connector: Arc<dyn ChatConnector>,
        identity: GatewayIdentity,
    ) -> WtfResult<Self> {
        let handle = connector.connect().await?;
        let gateway = Self {
            state: Arc::new(GatewayState {
                interpreter,
                connector: connector.clone(),
                handle,
                identity,
            }),
        };

        let inner = gateway.clone();
        let callback: EnvelopeCallback = Arc::new(move |envelope: MessageEnvelope| {
            let gateway = inner.clone();
            async move { gateway.handle_envelope(envelope).await.map(|_| ()) }.boxed()
        });
        connector
            .subscribe(&gateway.state.handle, callback)
            .await?;

        Ok(gateway)
    }

    /// Open the store, bind the loopback connector and serve until Ctrl-C.
    pub async fn serve(config: WtfConfig) -> WtfResult<()> {
        let store = SqliteGlossary::open(&config.general.db_path)?;
        let interpreter = Arc::new(Interpreter::from_config(Arc::new(store), &config.general));

        let shared_secret = config.gateway.shared_secret.clone().ok_or_else(|| {
            WtfError::Config("gateway.shared_secret is required to serve".to_string())
        })?;
        let connector = Arc::new(LoopbackWebhookConnector::new(LoopbackConnectorConfig {
            bind_addr: config.gateway.bind_addr.clone(),
            shared_secret,
            outbound_url: config.gateway.outbound_url.clone(),
            min_send_interval_ms: config.gateway.min_send_interval_ms,
        }));

        let identity = GatewayIdentity {
            nick: config.general.nick.clone(),
            rooms: config.room_names(),
        };
        let gateway = Self::attach(interpreter, connector, identity).await?;
        match gateway.local_addr() {
            Some(addr) => info!("[Gateway] {} serving on {}", config.general.nick, addr),
            None => info!("[Gateway] {} serving", config.general.nick),
        }

        tokio::signal::ctrl_c().await?;
        info!("[Gateway] shutting down");
        gateway.shutdown().await
    }

    /// Address the connector listens on, if it listens at all.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state.handle.local_addr
    }

    pub async fn shutdown(&self) -> WtfResult<()> {
        self.state.connector.disconnect(&self.state.handle).await
    }

    /// Answer one inbound message. Returns the send result if a reply was sent.
    pub async fn handle_envelope(&self, envelope: MessageEnvelope) -> WtfResult<Option<SendResult>> {
        if !self.accepts(&envelope) {
            debug!(
                "ignoring message {} from {} in {}",
                envelope.id, envelope.sender_id, envelope.channel_id
            );
            return Ok(None);
        }

        let interpreter = self.state.interpreter.clone();
        let text = envelope.text.clone();
        let sender = envelope.sender_id.clone();
        // Store calls block on SQLite; keep them off the async workers.
        let reply = tokio::task::spawn_blocking(move || reply_for(&interpreter, &text, &sender))
            .await
            .map_err(|e| WtfError::Connector(format!("message handler panicked: {}", e)))?;

        let Some(content) = reply else {
            return Ok(None);
        };

        let result = self
            .state
            .connector
            .send(
                &self.state.handle,
                OutboundRequest {
                    channel_id: envelope.channel_id,
                    content,
                    reply_to: Some(envelope.id),
                },
            )
            .await?;
        if !result.success {
            warn!("reply was not delivered: {:?}", result.error);
        }
        Ok(Some(result))
    }

    fn accepts(&self, envelope: &MessageEnvelope) -> bool {
        let identity = &self.state.identity;
        if envelope.sender_id.eq_ignore_ascii_case(&identity.nick) {
            return false;
        }
        identity.rooms.is_empty() || identity.rooms.iter().any(|r| r == &envelope.channel_id)
    }
}

/// Route message text to the command or the passive path.
pub fn reply_for(interpreter: &Interpreter, text: &str, sender: &str) -> Option<String> {
    match strip_command(text, interpreter.command()) {
        Some(argstr) => interpreter.respond_command(argstr, sender),
        None => interpreter.respond_passive(text),
    }
}

/// Argument string after `command`, if `text` is addressed to it.
fn strip_command<'a>(text: &'a str, command: &str) -> Option<&'a str> {
    let rest = text.trim_start().strip_prefix(command)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest),
        Some(_) => None,
    }
}
