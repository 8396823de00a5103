//! Create, copy, move, update and remove operations.
//!
//! Moves, renames and removals edit the local cache first and then tell the
//! server; nothing confirms them. Creates and copies complete through the
//! shared callback registry when the server echoes the callback id.

use std::sync::Arc;
use std::time::Duration;

use strata_protocol::{encode_field, CopyEntry, FolderMove, ItemMove, OutboundMessage};
use strata_sync::bridge;
use strata_types::{AssetType, FolderRecord, InventoryNode, InventoryType, ItemRecord, PermissionMask};
use tracing::debug;
use uuid::Uuid;

use crate::decode::item_to_block;
use crate::error::{SdkError, SdkResult};
use crate::manager::{Callback, CopyCallback, InventoryManager, ItemReply, OneShot};

/// Copies from notecards are always answered under this callback id.
const NOTECARD_CALLBACK_ID: u32 = 0;

/// Parameters of a new inventory item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewItem {
    pub folder_id: Uuid,
    pub name: String,
    pub description: String,
    pub asset_type: AssetType,
    /// Transaction of an asset uploaded beforehand, nil for none.
    pub transaction_id: Uuid,
    pub inv_type: InventoryType,
    /// 0 for items that are not wearables.
    pub wearable_type: u8,
    pub next_owner_mask: PermissionMask,
}

impl NewItem {
    pub fn new(folder_id: Uuid, name: impl Into<String>, asset_type: AssetType, inv_type: InventoryType) -> Self {
        Self {
            folder_id,
            name: name.into(),
            description: String::new(),
            asset_type,
            transaction_id: Uuid::nil(),
            inv_type,
            wearable_type: 0,
            next_owner_mask: PermissionMask::ALL,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// One item of a copy request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemCopy {
    pub item_id: Uuid,
    pub folder_id: Uuid,
    /// `None` keeps the original name.
    pub new_name: Option<String>,
}

/// Name given to a new folder created without one.
pub fn default_folder_name(preferred_type: AssetType) -> &'static str {
    match preferred_type {
        AssetType::Texture => "Textures",
        AssetType::Sound => "Sounds",
        AssetType::CallingCard => "Calling Cards",
        AssetType::Landmark => "Landmarks",
        AssetType::Script | AssetType::LslText | AssetType::LslBytecode => "Scripts",
        AssetType::Clothing => "Clothing",
        AssetType::Object => "Objects",
        AssetType::Notecard => "Notecards",
        AssetType::RootFolder => "Inventory",
        AssetType::TextureTga | AssetType::ImageTga | AssetType::ImageJpeg => "Uncompressed Images",
        AssetType::Bodypart => "Body Parts",
        AssetType::TrashFolder => "Trash",
        AssetType::SnapshotFolder => "Photo Album",
        AssetType::LostAndFoundFolder => "Lost And Found",
        AssetType::SoundWav => "Uncompressed Sounds",
        AssetType::Animation => "Animations",
        AssetType::Gesture => "Gestures",
        AssetType::Folder | AssetType::Unknown | AssetType::Simstate | AssetType::Other(_) => "New Folder",
    }
}

impl InventoryManager {
    // ---- Create ----

    pub fn request_create_item(&self, item: NewItem, on_complete: Callback<ItemRecord>) {
        let callback_id = self.item_replies.register(ItemReply::Created(on_complete));
        let sent = self.send(OutboundMessage::CreateInventoryItem {
            callback_id,
            folder_id: item.folder_id,
            transaction_id: item.transaction_id,
            next_owner_mask: item.next_owner_mask,
            asset_type: item.asset_type,
            inv_type: item.inv_type,
            wearable_type: item.wearable_type,
            name: encode_field(&item.name),
            description: encode_field(&item.description),
        });
        if let Err(err) = sent {
            if let Some(reply) = self.item_replies.take(callback_id) {
                reply.complete(Err(err));
            }
        }
    }

    pub fn create_item(&self, item: NewItem, timeout: Duration) -> SdkResult<ItemRecord> {
        let (completer, waiter) = bridge();
        self.request_create_item(
            item,
            Box::new(move |result| {
                completer.complete(result);
            }),
        );
        waiter.wait(timeout)?
    }

    /// Create a folder under `parent_id` and return its id. The folder is
    /// cached right away; an empty name picks the default for the type.
    pub fn create_folder(&self, parent_id: Uuid, name: &str, preferred_type: AssetType) -> SdkResult<Uuid> {
        let id = Uuid::now_v7();
        let name = if name.is_empty() {
            default_folder_name(preferred_type)
        } else {
            name
        };

        let mut folder = FolderRecord::new(id, parent_id, name);
        folder.owner_id = self.agent_id;
        folder.preferred_type = preferred_type;
        folder.version = 1;
        folder.descendent_count = 0;
        self.store.insert(folder);

        self.send(OutboundMessage::CreateInventoryFolder {
            folder_id: id,
            parent_id,
            preferred_type,
            name: encode_field(name),
        })?;
        debug!(folder = %id, parent = %parent_id, name, "folder created");
        Ok(id)
    }

    // ---- Copy ----

    /// Copy items owned by `old_owner`. `on_item` runs once per copy the
    /// server reports, each matched through its own callback id.
    pub fn request_copy_items(&self, copies: &[ItemCopy], old_owner: Uuid, on_item: CopyCallback) {
        if copies.is_empty() {
            return on_item(Err(SdkError::InvalidRequest("no items to copy".into())));
        }

        let entries: Vec<CopyEntry> = copies
            .iter()
            .map(|copy| CopyEntry {
                callback_id: self.item_replies.register(ItemReply::Copied(Arc::clone(&on_item))),
                old_agent_id: old_owner,
                old_item_id: copy.item_id,
                new_folder_id: copy.folder_id,
                new_name: copy.new_name.as_deref().map(encode_field).unwrap_or_default(),
            })
            .collect();
        let ids: Vec<u32> = entries.iter().map(|e| e.callback_id).collect();

        if let Err(err) = self.send(OutboundMessage::CopyInventoryItem { entries }) {
            for id in ids {
                self.item_replies.take(id);
            }
            on_item(Err(err));
        }
    }

    /// Copy one of the agent's own items.
    pub fn request_copy_item(
        &self,
        item_id: Uuid,
        folder_id: Uuid,
        new_name: Option<&str>,
        on_complete: Callback<ItemRecord>,
    ) {
        let once = OneShot::new(on_complete);
        self.request_copy_items(
            &[ItemCopy {
                item_id,
                folder_id,
                new_name: new_name.map(str::to_string),
            }],
            self.agent_id,
            Arc::new(move |result| once.fire(result)),
        );
    }

    /// Copy an item embedded in a notecard held by an object. Only one such
    /// copy can be outstanding at a time.
    pub fn request_copy_item_from_notecard(
        &self,
        object_id: Uuid,
        notecard_id: Uuid,
        folder_id: Uuid,
        item_id: Uuid,
        on_complete: Callback<ItemRecord>,
    ) {
        let once = OneShot::new(on_complete);
        self.item_replies.insert_at(
            NOTECARD_CALLBACK_ID,
            ItemReply::Copied(Arc::new(move |result| once.fire(result))),
        );
        let sent = self.send(OutboundMessage::CopyInventoryFromNotecard {
            notecard_id,
            object_id,
            folder_id,
            item_id,
        });
        if let Err(err) = sent {
            if let Some(reply) = self.item_replies.take(NOTECARD_CALLBACK_ID) {
                reply.complete(Err(err));
            }
        }
    }

    // ---- Move and rename ----

    pub fn move_item(&self, item_id: Uuid, folder_id: Uuid) -> SdkResult<()> {
        self.move_items(&[(item_id, folder_id)])
    }

    /// Move items, given as `(item, new folder)` pairs.
    pub fn move_items(&self, moves: &[(Uuid, Uuid)]) -> SdkResult<()> {
        if moves.is_empty() {
            return Err(SdkError::InvalidRequest("no items to move".into()));
        }
        for &(item_id, folder_id) in moves {
            self.store.update(item_id, |node| set_parent(node, folder_id));
        }
        self.send(OutboundMessage::MoveInventoryItem {
            stamp: false,
            entries: moves
                .iter()
                .map(|&(item_id, folder_id)| ItemMove {
                    item_id,
                    folder_id,
                    new_name: Vec::new(),
                })
                .collect(),
        })
    }

    /// Move an item and give it a new name in one request.
    pub fn rename_item(&self, item_id: Uuid, folder_id: Uuid, new_name: &str) -> SdkResult<()> {
        self.store.update(item_id, |node| {
            if let InventoryNode::Item(item) = node {
                item.parent_id = folder_id;
                item.name = new_name.to_string();
            }
        });
        self.send(OutboundMessage::MoveInventoryItem {
            stamp: false,
            entries: vec![ItemMove {
                item_id,
                folder_id,
                new_name: encode_field(new_name),
            }],
        })
    }

    pub fn move_folder(&self, folder_id: Uuid, parent_id: Uuid) -> SdkResult<()> {
        self.move_folders(&[(folder_id, parent_id)])
    }

    /// Move folders, given as `(folder, new parent)` pairs.
    pub fn move_folders(&self, moves: &[(Uuid, Uuid)]) -> SdkResult<()> {
        if moves.is_empty() {
            return Err(SdkError::InvalidRequest("no folders to move".into()));
        }
        for &(folder_id, parent_id) in moves {
            self.store.update(folder_id, |node| set_parent(node, parent_id));
        }
        self.send(OutboundMessage::MoveInventoryFolder {
            stamp: false,
            entries: moves
                .iter()
                .map(|&(folder_id, parent_id)| FolderMove { folder_id, parent_id })
                .collect(),
        })
    }

    pub fn rename_folder(&self, folder_id: Uuid, parent_id: Uuid, new_name: &str) -> SdkResult<()> {
        self.store.update(folder_id, |node| {
            if let InventoryNode::Folder(folder) = node {
                folder.name = new_name.to_string();
            }
        });
        self.send(OutboundMessage::UpdateInventoryFolder {
            folder_id,
            parent_id,
            preferred_type: AssetType::Unknown,
            name: encode_field(new_name),
        })
    }

    // ---- Update ----

    /// Push edited item records to the server. Returns the transaction id.
    pub fn update_items(&self, items: &[ItemRecord]) -> SdkResult<Uuid> {
        if items.is_empty() {
            return Err(SdkError::InvalidRequest("no items to update".into()));
        }
        let transaction_id = Uuid::now_v7();
        for item in items {
            self.store.insert(item.clone());
        }
        self.send(OutboundMessage::UpdateInventoryItem {
            transaction_id,
            items: items.iter().map(|item| item_to_block(item, Uuid::nil())).collect(),
        })?;
        Ok(transaction_id)
    }

    // ---- Remove ----

    /// Remove items and folders. A side with no entries travels as a single
    /// nil id; nothing is sent when both are empty.
    pub fn remove(&self, item_ids: &[Uuid], folder_ids: &[Uuid]) -> SdkResult<()> {
        if item_ids.is_empty() && folder_ids.is_empty() {
            return Ok(());
        }
        for &id in item_ids.iter().chain(folder_ids) {
            self.store.remove(id);
        }
        let or_sentinel = |ids: &[Uuid]| {
            if ids.is_empty() {
                vec![Uuid::nil()]
            } else {
                ids.to_vec()
            }
        };
        self.send(OutboundMessage::RemoveInventoryObjects {
            item_ids: or_sentinel(item_ids),
            folder_ids: or_sentinel(folder_ids),
        })
    }

    pub fn remove_item(&self, item_id: Uuid) -> SdkResult<()> {
        self.remove(&[item_id], &[])
    }

    pub fn remove_folder(&self, folder_id: Uuid) -> SdkResult<()> {
        self.remove(&[], &[folder_id])
    }

    /// Delete everything inside a folder, keeping the folder itself.
    pub fn remove_descendants(&self, folder_id: Uuid) -> SdkResult<()> {
        self.send(OutboundMessage::PurgeInventoryDescendents { folder_id })?;
        for child in self.store.contents(folder_id) {
            self.store.remove(child.id());
        }
        Ok(())
    }

    pub fn empty_trash(&self) -> SdkResult<()> {
        self.empty_system_folder(AssetType::TrashFolder)
    }

    pub fn empty_lost_and_found(&self) -> SdkResult<()> {
        self.empty_system_folder(AssetType::LostAndFoundFolder)
    }

    fn empty_system_folder(&self, preferred: AssetType) -> SdkResult<()> {
        let Some(folder_id) = self.system_folder(preferred) else {
            debug!(folder_type = %preferred, "no system folder to empty");
            return Ok(());
        };
        let (folders, items): (Vec<InventoryNode>, Vec<InventoryNode>) = self
            .store
            .contents(folder_id)
            .into_iter()
            .partition(InventoryNode::is_folder);
        let folder_ids: Vec<Uuid> = folders.iter().map(InventoryNode::id).collect();
        let item_ids: Vec<Uuid> = items.iter().map(InventoryNode::id).collect();
        self.remove(&item_ids, &folder_ids)
    }
}

fn set_parent(node: &mut InventoryNode, parent_id: Uuid) {
    match node {
        InventoryNode::Item(item) => item.parent_id = parent_id,
        InventoryNode::Folder(folder) => folder.parent_id = parent_id,
    }
}
