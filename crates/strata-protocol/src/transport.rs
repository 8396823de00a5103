use std::sync::Weak;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ProtocolResult;
use crate::message::OutboundMessage;
use crate::packet::{InboundPacket, PacketKind};

/// Receives decoded inbound packets on the transport's dispatch thread.
///
/// Implementations must not block: the dispatch thread delivers packets one
/// at a time and every other subscriber waits behind a slow handler.
pub trait PacketHandler: Send + Sync {
    fn handle_packet(&self, packet: InboundPacket);
}

/// Packet transport to the simulator.
///
/// Handlers are held weakly so that dropping the subscriber detaches it.
pub trait Transport: Send + Sync {
    fn send(&self, message: OutboundMessage) -> ProtocolResult<()>;
    fn register_handler(&self, kind: PacketKind, handler: Weak<dyn PacketHandler>);
}

/// Completion for an asset download.
pub type AssetCallback = Box<dyn FnOnce(ProtocolResult<Bytes>) + Send>;

/// Downloads raw asset bytes by filename, completing through a callback.
pub trait AssetFetch: Send + Sync {
    fn request_bytes(&self, filename: &str, on_complete: AssetCallback);
}

/// Capability HTTP client.
#[async_trait]
pub trait CapsClient: Send + Sync {
    /// URL of a named capability, if the simulator granted it.
    fn capability(&self, name: &str) -> Option<String>;
    async fn post_json(&self, url: &str, body: serde_json::Value) -> ProtocolResult<serde_json::Value>;
    async fn post_bytes(&self, url: &str, body: Bytes) -> ProtocolResult<serde_json::Value>;
}
