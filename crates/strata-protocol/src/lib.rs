//! Logical inventory protocol for Strata.
//!
//! Defines the outbound request messages and inbound reply packets the
//! inventory engine exchanges with a simulator, expressed as typed fields
//! rather than wire bytes. Framing, retransmission and byte layout belong to
//! the [`Transport`] implementation.
//!
//! Also defines the other collaborators the engine consumes: [`AssetFetch`]
//! for downloading task inventory blobs and [`CapsClient`] for capability
//! HTTP requests. [`memory`] provides in-process implementations of all
//! three.

pub mod error;
pub mod memory;
pub mod message;
pub mod packet;
pub mod transport;

pub use error::{ProtocolError, ProtocolResult};
pub use memory::{CapsRequestBody, InMemoryAssets, InMemoryTransport, ScriptedCaps};
pub use message::{
    capabilities, CopyEntry, FetchEntry, FolderMove, ItemMove, OutboundMessage, RezParams,
};
pub use packet::{decode_field, encode_field, FolderBlock, InboundPacket, ItemBlock, PacketKind};
pub use transport::{AssetCallback, AssetFetch, CapsClient, PacketHandler, Transport};
