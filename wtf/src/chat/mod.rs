//! Chat adapter: a connector that carries messages in and replies out, and a
//! gateway that routes them through the interpreter.

pub mod connector;
pub mod gateway;

pub use connector::{
    ChatConnector, ConnectionHandle, EnvelopeCallback, LoopbackConnectorConfig,
    LoopbackWebhookConnector, MessageEnvelope, OutboundRequest, SendResult, INBOUND_PATH,
    SECRET_HEADER,
};
pub use gateway::{reply_for, GatewayIdentity, WtfGateway};
