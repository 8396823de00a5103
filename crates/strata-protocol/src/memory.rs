//! In-process collaborators.
//!
//! [`InMemoryTransport`] records every outbound message and delivers
//! inbound packets synchronously on the caller's thread, which then plays
//! the role of the dispatch thread.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::OutboundMessage;
use crate::packet::{InboundPacket, PacketKind};
use crate::transport::{AssetCallback, AssetFetch, CapsClient, PacketHandler, Transport};

#[derive(Default)]
pub struct InMemoryTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    handlers: RwLock<HashMap<PacketKind, Vec<Weak<dyn PacketHandler>>>>,
    offline: AtomicBool,
}

impl InMemoryTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// While offline, every send fails with [`ProtocolError::Disconnected`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Deliver a packet to every live handler registered for its kind.
    /// Returns the number of handlers invoked.
    pub fn deliver(&self, packet: InboundPacket) -> usize {
        let targets: Vec<Arc<dyn PacketHandler>> = {
            let mut handlers = self.handlers.write().expect("lock poisoned");
            match handlers.get_mut(&packet.kind()) {
                Some(list) => {
                    list.retain(|h| h.strong_count() > 0);
                    list.iter().filter_map(Weak::upgrade).collect()
                }
                None => Vec::new(),
            }
        };
        for handler in &targets {
            handler.handle_packet(packet.clone());
        }
        targets.len()
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().expect("lock poisoned").clone()
    }

    /// Drain the recorded messages.
    pub fn take_sent(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.sent.lock().expect("lock poisoned"))
    }

    pub fn last_sent(&self) -> Option<OutboundMessage> {
        self.sent.lock().expect("lock poisoned").last().cloned()
    }

    pub fn handler_count(&self, kind: PacketKind) -> usize {
        self.handlers
            .read()
            .expect("lock poisoned")
            .get(&kind)
            .map_or(0, |list| list.iter().filter(|h| h.strong_count() > 0).count())
    }
}

impl Transport for InMemoryTransport {
    fn send(&self, message: OutboundMessage) -> ProtocolResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProtocolError::Disconnected);
        }
        debug!(message = message.type_name(), "send");
        self.sent.lock().expect("lock poisoned").push(message);
        Ok(())
    }

    fn register_handler(&self, kind: PacketKind, handler: Weak<dyn PacketHandler>) {
        self.handlers
            .write()
            .expect("lock poisoned")
            .entry(kind)
            .or_default()
            .push(handler);
    }
}

/// Asset store that answers downloads immediately from a map.
#[derive(Default)]
pub struct InMemoryAssets {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryAssets {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, filename: impl Into<String>, data: impl Into<Bytes>) {
        self.blobs
            .write()
            .expect("lock poisoned")
            .insert(filename.into(), data.into());
    }
}

impl AssetFetch for InMemoryAssets {
    fn request_bytes(&self, filename: &str, on_complete: AssetCallback) {
        let found = self
            .blobs
            .read()
            .expect("lock poisoned")
            .get(filename)
            .cloned();
        match found {
            Some(data) => on_complete(Ok(data)),
            None => on_complete(Err(ProtocolError::AssetUnavailable(filename.to_string()))),
        }
    }
}

/// Capability client that replays canned responses in order and records
/// every request it receives.
#[derive(Default)]
pub struct ScriptedCaps {
    urls: RwLock<HashMap<String, String>>,
    responses: Mutex<VecDeque<ProtocolResult<serde_json::Value>>>,
    requests: Mutex<Vec<(String, CapsRequestBody)>>,
}

/// Body of a recorded capability request.
#[derive(Clone, Debug, PartialEq)]
pub enum CapsRequestBody {
    Json(serde_json::Value),
    Bytes(Bytes),
}

impl ScriptedCaps {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn grant(&self, name: impl Into<String>, url: impl Into<String>) {
        self.urls
            .write()
            .expect("lock poisoned")
            .insert(name.into(), url.into());
    }

    pub fn push_response(&self, response: ProtocolResult<serde_json::Value>) {
        self.responses
            .lock()
            .expect("lock poisoned")
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<(String, CapsRequestBody)> {
        self.requests.lock().expect("lock poisoned").clone()
    }

    fn respond(&self, url: &str, body: CapsRequestBody) -> ProtocolResult<serde_json::Value> {
        self.requests
            .lock()
            .expect("lock poisoned")
            .push((url.to_string(), body));
        self.responses
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(ProtocolError::Http(format!("no response scripted for {url}"))))
    }
}

#[async_trait]
impl CapsClient for ScriptedCaps {
    fn capability(&self, name: &str) -> Option<String> {
        self.urls.read().expect("lock poisoned").get(name).cloned()
    }

    async fn post_json(&self, url: &str, body: serde_json::Value) -> ProtocolResult<serde_json::Value> {
        self.respond(url, CapsRequestBody::Json(body))
    }

    async fn post_bytes(&self, url: &str, body: Bytes) -> ProtocolResult<serde_json::Value> {
        self.respond(url, CapsRequestBody::Bytes(body))
    }
}
