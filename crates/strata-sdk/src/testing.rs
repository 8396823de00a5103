//! Shared fixtures for the manager tests.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use strata_protocol::{
    FolderBlock, InMemoryAssets, InMemoryTransport, InboundPacket, ItemBlock, OutboundMessage,
    ScriptedCaps,
};
use strata_sync::SyncConfig;
use uuid::Uuid;

use crate::config::InventoryConfig;
use crate::manager::InventoryManager;

pub(crate) use crate::decode::tests::block as item_block;

pub(crate) struct Harness {
    pub transport: Arc<InMemoryTransport>,
    pub assets: Arc<InMemoryAssets>,
    pub caps: Arc<ScriptedCaps>,
    pub manager: Arc<InventoryManager>,
}

pub(crate) fn agent() -> Uuid {
    Uuid::from_u128(0xA)
}

pub(crate) fn manager() -> Harness {
    manager_with(InventoryConfig {
        sync: SyncConfig::retain_forever(),
        ..InventoryConfig::default()
    })
}

pub(crate) fn manager_with(config: InventoryConfig) -> Harness {
    let transport = InMemoryTransport::new();
    let assets = InMemoryAssets::new();
    let caps = ScriptedCaps::new();
    let manager = InventoryManager::builder(agent(), transport.clone())
        .assets(assets.clone())
        .caps(caps.clone())
        .config(config)
        .build();
    Harness {
        transport,
        assets,
        caps,
        manager,
    }
}

pub(crate) fn descendents(
    folder_id: Uuid,
    version: i32,
    descendents: i32,
    folders: Vec<FolderBlock>,
    items: Vec<ItemBlock>,
) -> InboundPacket {
    InboundPacket::InventoryDescendents {
        owner_id: agent(),
        folder_id,
        version,
        descendents,
        folders,
        items,
    }
}

/// Spin until a message matching `pred` has been sent, so a blocking call
/// running on another thread has registered its request.
pub(crate) fn wait_for_sent(transport: &InMemoryTransport, pred: impl Fn(&OutboundMessage) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !transport.sent().iter().any(&pred) {
        assert!(Instant::now() < deadline, "request was never sent");
        thread::sleep(Duration::from_millis(1));
    }
}
