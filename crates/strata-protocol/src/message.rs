use serde::{Deserialize, Serialize};
use strata_types::{AssetType, DeRezDestination, InventorySortOrder, InventoryType, PermissionMask};
use uuid::Uuid;

use crate::packet::ItemBlock;

/// One item in a batch fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchEntry {
    pub item_id: Uuid,
    pub owner_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyEntry {
    pub callback_id: u32,
    pub old_agent_id: Uuid,
    pub old_item_id: Uuid,
    pub new_folder_id: Uuid,
    pub new_name: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMove {
    pub item_id: Uuid,
    pub folder_id: Uuid,
    /// Empty keeps the current name.
    pub new_name: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderMove {
    pub folder_id: Uuid,
    pub parent_id: Uuid,
}

/// Placement of an object rezzed from inventory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RezParams {
    pub group_id: Uuid,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    /// Ask the simulator to send object details back once rezzed.
    pub rez_selected: bool,
}

/// Requests the inventory engine hands to the transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OutboundMessage {
    FetchInventoryDescendents {
        folder_id: Uuid,
        owner_id: Uuid,
        sort_order: InventorySortOrder,
        fetch_folders: bool,
        fetch_items: bool,
    },
    FetchInventory {
        entries: Vec<FetchEntry>,
    },
    CreateInventoryItem {
        callback_id: u32,
        folder_id: Uuid,
        transaction_id: Uuid,
        next_owner_mask: PermissionMask,
        asset_type: AssetType,
        inv_type: InventoryType,
        wearable_type: u8,
        name: Vec<u8>,
        description: Vec<u8>,
    },
    CreateInventoryFolder {
        folder_id: Uuid,
        parent_id: Uuid,
        preferred_type: AssetType,
        name: Vec<u8>,
    },
    UpdateInventoryFolder {
        folder_id: Uuid,
        parent_id: Uuid,
        preferred_type: AssetType,
        name: Vec<u8>,
    },
    MoveInventoryFolder {
        stamp: bool,
        entries: Vec<FolderMove>,
    },
    MoveInventoryItem {
        stamp: bool,
        entries: Vec<ItemMove>,
    },
    CopyInventoryItem {
        entries: Vec<CopyEntry>,
    },
    CopyInventoryFromNotecard {
        notecard_id: Uuid,
        object_id: Uuid,
        folder_id: Uuid,
        item_id: Uuid,
    },
    UpdateInventoryItem {
        transaction_id: Uuid,
        items: Vec<ItemBlock>,
    },
    /// A nil id in either list stands for "no entries of this kind".
    RemoveInventoryObjects {
        item_ids: Vec<Uuid>,
        folder_ids: Vec<Uuid>,
    },
    PurgeInventoryDescendents {
        folder_id: Uuid,
    },
    RezObject {
        params: RezParams,
        item: ItemBlock,
    },
    DeRezObject {
        local_id: u32,
        destination: DeRezDestination,
        destination_id: Uuid,
        transaction_id: Uuid,
    },
    /// Inventory offer carried as an instant message. The bucket holds one
    /// 17-byte entry per offered object: asset type, then the 16 id bytes.
    InventoryOffer {
        recipient: Uuid,
        session_id: Uuid,
        name: Vec<u8>,
        bucket: Vec<u8>,
    },
    RequestTaskInventory {
        local_id: u32,
    },
    UpdateTaskInventory {
        local_id: u32,
        item: ItemBlock,
    },
    RemoveTaskInventory {
        local_id: u32,
        item_id: Uuid,
    },
    MoveTaskInventory {
        local_id: u32,
        item_id: Uuid,
        folder_id: Uuid,
    },
}

impl OutboundMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::FetchInventoryDescendents { .. } => "FetchInventoryDescendents",
            Self::FetchInventory { .. } => "FetchInventory",
            Self::CreateInventoryItem { .. } => "CreateInventoryItem",
            Self::CreateInventoryFolder { .. } => "CreateInventoryFolder",
            Self::UpdateInventoryFolder { .. } => "UpdateInventoryFolder",
            Self::MoveInventoryFolder { .. } => "MoveInventoryFolder",
            Self::MoveInventoryItem { .. } => "MoveInventoryItem",
            Self::CopyInventoryItem { .. } => "CopyInventoryItem",
            Self::CopyInventoryFromNotecard { .. } => "CopyInventoryFromNotecard",
            Self::UpdateInventoryItem { .. } => "UpdateInventoryItem",
            Self::RemoveInventoryObjects { .. } => "RemoveInventoryObjects",
            Self::PurgeInventoryDescendents { .. } => "PurgeInventoryDescendents",
            Self::RezObject { .. } => "RezObject",
            Self::DeRezObject { .. } => "DeRezObject",
            Self::InventoryOffer { .. } => "ImprovedInstantMessage",
            Self::RequestTaskInventory { .. } => "RequestTaskInventory",
            Self::UpdateTaskInventory { .. } => "UpdateTaskInventory",
            Self::RemoveTaskInventory { .. } => "RemoveTaskInventory",
            Self::MoveTaskInventory { .. } => "MoveTaskInventory",
        }
    }
}

pub mod capabilities {
    /// Capability that accepts new inventory items backed by uploaded assets.
    pub const NEW_FILE_AGENT_INVENTORY: &str = "NewFileAgentInventory";
}
