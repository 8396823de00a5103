//! Inbound packet dispatch.
//!
//! Runs on the transport's dispatch thread. Each handler decodes the
//! packet's blocks, refreshes the local cache, and completes whatever
//! pending requests the records satisfy.

use strata_protocol::{decode_field, FolderBlock, InboundPacket, ItemBlock, PacketHandler};
use strata_types::{FolderRecord, ItemRecord};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::decode::{folder_from_block, is_folder_block, item_from_block};
use crate::event::InventoryEvent;
use crate::manager::InventoryManager;

impl PacketHandler for InventoryManager {
    fn handle_packet(&self, packet: InboundPacket) {
        self.prune_expired();
        match packet {
            InboundPacket::InventoryDescendents {
                owner_id,
                folder_id,
                version,
                descendents,
                folders,
                items,
            } => self.on_descendents(owner_id, folder_id, version, descendents, &folders, &items),
            InboundPacket::FetchInventoryReply { items, .. } => self.on_fetch_reply(&items),
            InboundPacket::UpdateCreateInventoryItem { items, .. } => self.on_update_create(&items),
            InboundPacket::BulkUpdateInventory {
                agent_id,
                folders,
                items,
                ..
            } => self.on_bulk_update(agent_id, &folders, &items),
            InboundPacket::ReplyTaskInventory {
                task_id,
                serial,
                filename,
            } => self.on_task_reply(task_id, serial, decode_field(&filename)),
        }
    }
}

impl InventoryManager {
    fn prune_expired(&self) {
        let Some(max_age) = self.config.sync.request_expiry else {
            return;
        };
        let expired = self.listings.prune_expired(max_age)
            + self.fetches.prune_expired(max_age)
            + self.task_replies.prune_expired(max_age);
        if expired > 0 {
            debug!(expired, "expired pending inventory requests");
        }
    }

    /// Cache a folder without losing the version and child count learned
    /// from earlier listings.
    fn cache_folder(&self, mut folder: FolderRecord) {
        if let Some(cached) = self.store.folder(folder.id) {
            folder.version = cached.version;
            folder.descendent_count = cached.descendent_count;
        }
        self.store.insert(folder);
    }

    fn on_descendents(
        &self,
        owner_id: Uuid,
        folder_id: Uuid,
        version: i32,
        descendents: i32,
        folder_blocks: &[FolderBlock],
        item_blocks: &[ItemBlock],
    ) {
        let folders: Vec<FolderRecord> = folder_blocks
            .iter()
            .map(|block| folder_from_block(block, owner_id))
            .collect();
        let items: Vec<ItemRecord> = item_blocks
            .iter()
            .map(|block| {
                let mut item = item_from_block(block);
                item.owner_id = owner_id;
                item
            })
            .collect();

        for folder in folders.iter().filter(|f| !f.id.is_nil()) {
            self.cache_folder(folder.clone());
        }
        for item in items.iter().filter(|i| !i.id.is_nil()) {
            self.store.insert(item.clone());
        }

        match self.store.folder(folder_id) {
            Some(cached) if version < cached.version => {
                warn!(
                    folder = %folder_id,
                    name = %cached.name,
                    version,
                    latest = cached.version,
                    "outdated folder listing"
                );
            }
            Some(_) => {
                self.store.update_folder_version(folder_id, version, descendents);
                self.publish(InventoryEvent::FolderUpdated { folder_id });
            }
            None => debug!(folder = %folder_id, "listing for a folder not in the cache"),
        }

        self.listings.on_packet(folder_id, descendents, items, folders);
    }

    fn on_fetch_reply(&self, blocks: &[ItemBlock]) {
        for block in blocks {
            if is_folder_block(block) {
                error!(item = %block.item_id, "fetch reply carries a folder");
                continue;
            }
            let item = item_from_block(block);
            self.store.insert(item.clone());
            self.publish(InventoryEvent::ItemReceived(item.clone()));
            self.fetches.on_item_resolved(&item);
        }
    }

    fn on_update_create(&self, blocks: &[ItemBlock]) {
        for block in blocks {
            if is_folder_block(block) {
                error!(item = %block.item_id, "update-create reply carries a folder");
                continue;
            }
            let mut item = item_from_block(block);

            // attachments come back without a folder
            if item.parent_id.is_nil() {
                let folder = self.find_folder_for_type(item.asset_type);
                if !folder.is_nil() {
                    debug!(item = %item.id, folder = %folder, "placing folderless item");
                    item.parent_id = folder;
                    if let Err(err) = self.update_items(std::slice::from_ref(&item)) {
                        warn!(item = %item.id, error = %err, "could not send folder fix-up");
                    }
                }
            }

            self.store.insert(item.clone());
            self.complete_callbacks(block.callback_id, &item);
            self.publish(InventoryEvent::TaskItemReceived {
                item_id: item.id,
                folder_id: block.folder_id,
                creator_id: item.creator_id,
                asset_id: item.asset_id,
                inv_type: item.inv_type,
            });
        }
    }

    fn on_bulk_update(&self, agent_id: Uuid, folder_blocks: &[FolderBlock], item_blocks: &[ItemBlock]) {
        if folder_blocks.first().is_some_and(|b| !b.folder_id.is_nil()) {
            for block in folder_blocks {
                if !self.store.contains(block.folder_id) {
                    debug!(folder = %block.folder_id, "bulk update for an uncached folder");
                }
                self.cache_folder(folder_from_block(block, agent_id));
            }
        }

        if item_blocks.first().is_some_and(|b| !b.item_id.is_nil()) {
            for block in item_blocks {
                let item = item_from_block(block);
                self.store.insert(item.clone());
                self.complete_callbacks(block.callback_id, &item);
            }
        }
    }

    fn on_task_reply(&self, task_id: Uuid, serial: i16, filename: String) {
        let waiters = self.task_replies.notify(&task_id, filename.clone());
        debug!(task = %task_id, serial, waiters, "task inventory reply");
        self.publish(InventoryEvent::TaskInventoryReply {
            task_id,
            serial,
            filename,
        });
    }

    /// Fire the create or copy callback registered under `callback_id`.
    fn complete_callbacks(&self, callback_id: u32, item: &ItemRecord) {
        if let Some(reply) = self.item_replies.take(callback_id) {
            reply.complete(Ok(item.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use strata_protocol::{encode_field, OutboundMessage, PacketKind};
    use strata_sync::SyncConfig;
    use strata_types::{AssetType, InventorySkeleton, InventoryType};

    use super::*;
    use crate::config::InventoryConfig;
    use crate::error::SdkError;
    use crate::event::{EventFilter, EventKind};
    use crate::manager::FolderQuery;
    use crate::mutate::NewItem;
    use crate::testing::{agent, descendents, item_block, manager, manager_with, Harness};

    fn update_create(items: Vec<ItemBlock>) -> InboundPacket {
        InboundPacket::UpdateCreateInventoryItem {
            sim_approved: true,
            transaction_id: Uuid::nil(),
            items,
        }
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    #[test]
    fn subscribes_to_every_packet_kind() {
        let Harness { transport, manager, .. } = manager();
        for kind in PacketKind::ALL {
            assert_eq!(transport.handler_count(kind), 1, "{kind}");
        }
        drop(manager);
        assert_eq!(transport.handler_count(PacketKind::FetchInventoryReply), 0);
    }

    // ------------------------------------------------------------------
    // Descendents
    // ------------------------------------------------------------------

    #[test]
    fn listing_updates_folder_version() {
        let Harness { transport, manager, .. } = manager();
        let folder = Uuid::from_u128(0xF);
        manager.store().insert(FolderRecord::new(folder, Uuid::nil(), "Stuff"));
        let mut events = manager.subscribe(EventFilter::kinds([EventKind::FolderUpdated]));

        transport.deliver(descendents(folder, 4, 1, vec![], vec![item_block(1, 0xF, "A")]));
        let cached = manager.store().folder(folder).unwrap();
        assert_eq!((cached.version, cached.descendent_count), (4, 1));
        assert!(events.try_recv().is_ok());

        transport.deliver(descendents(folder, 3, 9, vec![], vec![item_block(2, 0xF, "B")]));
        assert_eq!(manager.store().folder(folder).unwrap().version, 4);
        assert!(events.try_recv().is_err(), "outdated reply raises no event");
    }

    #[test]
    fn listing_caches_children_with_packet_owner() {
        let Harness { transport, manager, .. } = manager();
        let folder = Uuid::from_u128(0xF);
        let mut wire = item_block(1, 0xF, "A");
        wire.owner_id = Uuid::from_u128(0xBEEF);
        transport.deliver(descendents(folder, 1, 1, vec![], vec![wire]));
        let item = manager.store().get(Uuid::from_u128(1)).unwrap();
        assert_eq!(item.as_item().unwrap().owner_id, agent());
    }

    #[test]
    fn nil_sentinels_are_not_cached() {
        let Harness { transport, manager, .. } = manager();
        let folder = Uuid::from_u128(0xF);
        let sentinel = FolderBlock {
            name: encode_field(""),
            ..FolderBlock::default()
        };
        let got = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&got);
        manager.request_folder_contents(
            FolderQuery::new(folder, agent()),
            Box::new(move |r| *slot.lock().unwrap() = Some(r.unwrap().len())),
            None,
        );
        transport.deliver(descendents(folder, 1, 1, vec![sentinel], vec![item_block(1, 0xF, "A")]));
        assert_eq!(*got.lock().unwrap(), Some(1));
        assert!(!manager.store().contains(Uuid::nil()));
    }

    // ------------------------------------------------------------------
    // Update-create and bulk update
    // ------------------------------------------------------------------

    #[test]
    fn folder_blocks_in_item_replies_are_skipped() {
        let Harness { transport, manager, .. } = manager();
        let mut wire = item_block(1, 0xF, "Oops");
        wire.inv_type = InventoryType::Folder.code();
        transport.deliver(update_create(vec![wire.clone()]));
        transport.deliver(InboundPacket::FetchInventoryReply {
            agent_id: agent(),
            items: vec![wire],
        });
        assert!(manager.store().is_empty());
    }

    #[test]
    fn folderless_item_is_placed_and_updated() {
        let Harness { transport, manager, .. } = manager();
        let root = Uuid::from_u128(0x100);
        let mut objects = FolderRecord::new(Uuid::from_u128(0x101), root, "Objects");
        objects.preferred_type = AssetType::Object;
        manager.set_skeleton(InventorySkeleton {
            root_id: root,
            owner_id: agent(),
            folders: vec![objects],
        });

        let mut wire = item_block(1, 0, "Hat");
        wire.asset_type = AssetType::Object.code();
        wire.inv_type = InventoryType::Object.code();
        transport.deliver(update_create(vec![wire]));

        let item = manager.store().get(Uuid::from_u128(1)).unwrap();
        assert_eq!(item.parent_id(), Uuid::from_u128(0x101));
        match transport.last_sent() {
            Some(OutboundMessage::UpdateInventoryItem { items, .. }) => {
                assert_eq!(items[0].folder_id, Uuid::from_u128(0x101));
                assert_eq!(items[0].crc, item.as_item().unwrap().checksum());
            }
            other => panic!("expected an item update, got {other:?}"),
        }
    }

    #[test]
    fn update_create_announces_task_item() {
        let Harness { transport, manager, .. } = manager();
        let mut events = manager.subscribe(EventFilter::kinds([EventKind::TaskItemReceived]));
        transport.deliver(update_create(vec![item_block(5, 0xF, "Gift")]));
        match events.try_recv().unwrap() {
            InventoryEvent::TaskItemReceived { item_id, folder_id, .. } => {
                assert_eq!(item_id, Uuid::from_u128(5));
                assert_eq!(folder_id, Uuid::from_u128(0xF));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn bulk_update_fires_create_callback() {
        let Harness { transport, manager, .. } = manager();
        let got = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&got);
        manager.request_create_item(
            NewItem::new(Uuid::from_u128(0xF), "Note", AssetType::Notecard, InventoryType::Notecard),
            Box::new(move |r| *slot.lock().unwrap() = Some(r)),
        );
        let callback_id = match transport.last_sent() {
            Some(OutboundMessage::CreateInventoryItem { callback_id, .. }) => callback_id,
            other => panic!("expected a create, got {other:?}"),
        };

        let mut wire = item_block(6, 0xF, "Note");
        wire.callback_id = callback_id;
        transport.deliver(InboundPacket::BulkUpdateInventory {
            agent_id: agent(),
            transaction_id: Uuid::nil(),
            folders: vec![FolderBlock::default()],
            items: vec![wire],
        });

        let item = got.lock().unwrap().take().unwrap().unwrap();
        assert_eq!(item.id, Uuid::from_u128(6));
        assert_eq!(manager.pending_requests().creates, 0);
        assert!(!manager.store().contains(Uuid::nil()));
    }

    // ------------------------------------------------------------------
    // Expiry
    // ------------------------------------------------------------------

    #[test]
    fn stale_requests_expire_on_next_packet() {
        let Harness { transport, manager, .. } = manager_with(InventoryConfig {
            sync: SyncConfig {
                request_expiry: Some(Duration::from_millis(10)),
            },
            ..InventoryConfig::default()
        });
        let got = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&got);
        manager.request_fetch_item(Uuid::from_u128(1), agent(), Box::new(move |r| *slot.lock().unwrap() = Some(r)));
        thread::sleep(Duration::from_millis(30));

        transport.deliver(InboundPacket::FetchInventoryReply {
            agent_id: agent(),
            items: vec![item_block(2, 0xF, "Other")],
        });
        assert!(matches!(
            got.lock().unwrap().take(),
            Some(Err(SdkError::Sync(strata_sync::SyncError::Expired { .. })))
        ));
        assert_eq!(manager.pending_requests().fetches, 0);
    }
}
