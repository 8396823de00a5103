use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Decode a wire byte-string: lossy UTF-8 with a trailing NUL removed.
pub fn decode_field(bytes: &[u8]) -> String {
    let trimmed = bytes.strip_suffix(b"\0").unwrap_or(bytes);
    String::from_utf8_lossy(trimmed).into_owned()
}

/// Encode a wire byte-string, NUL-terminated.
pub fn encode_field(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() + 1);
    bytes.extend_from_slice(text.as_bytes());
    bytes.push(0);
    bytes
}

/// Raw item fields as carried by inventory packets in both directions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBlock {
    pub item_id: Uuid,
    pub folder_id: Uuid,
    /// Correlation token echoed from a create or copy request; 0 otherwise.
    pub callback_id: u32,
    pub transaction_id: Uuid,
    pub creator_id: Uuid,
    pub owner_id: Uuid,
    pub group_id: Uuid,
    pub asset_id: Uuid,
    pub base_mask: u32,
    pub owner_mask: u32,
    pub group_mask: u32,
    pub everyone_mask: u32,
    pub next_owner_mask: u32,
    pub group_owned: bool,
    pub asset_type: i8,
    pub inv_type: i8,
    pub flags: u32,
    pub sale_type: u8,
    pub sale_price: i32,
    pub name: Vec<u8>,
    pub description: Vec<u8>,
    pub creation_date: i32,
    pub crc: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderBlock {
    pub folder_id: Uuid,
    pub parent_id: Uuid,
    pub preferred_type: i8,
    pub name: Vec<u8>,
}

/// Inbound packet types the inventory engine subscribes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketKind {
    InventoryDescendents,
    FetchInventoryReply,
    UpdateCreateInventoryItem,
    BulkUpdateInventory,
    ReplyTaskInventory,
}

impl PacketKind {
    pub const ALL: [PacketKind; 5] = [
        Self::InventoryDescendents,
        Self::FetchInventoryReply,
        Self::UpdateCreateInventoryItem,
        Self::BulkUpdateInventory,
        Self::ReplyTaskInventory,
    ];
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Decoded inbound packets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundPacket {
    /// One fragment of a folder listing.
    InventoryDescendents {
        owner_id: Uuid,
        folder_id: Uuid,
        version: i32,
        /// Total direct children of the folder.
        descendents: i32,
        folders: Vec<FolderBlock>,
        items: Vec<ItemBlock>,
    },
    FetchInventoryReply {
        agent_id: Uuid,
        items: Vec<ItemBlock>,
    },
    UpdateCreateInventoryItem {
        sim_approved: bool,
        transaction_id: Uuid,
        items: Vec<ItemBlock>,
    },
    BulkUpdateInventory {
        agent_id: Uuid,
        transaction_id: Uuid,
        folders: Vec<FolderBlock>,
        items: Vec<ItemBlock>,
    },
    ReplyTaskInventory {
        task_id: Uuid,
        serial: i16,
        /// Asset filename of the task inventory blob; empty when the task
        /// holds nothing.
        filename: Vec<u8>,
    },
}

impl InboundPacket {
    pub fn kind(&self) -> PacketKind {
        match self {
            Self::InventoryDescendents { .. } => PacketKind::InventoryDescendents,
            Self::FetchInventoryReply { .. } => PacketKind::FetchInventoryReply,
            Self::UpdateCreateInventoryItem { .. } => PacketKind::UpdateCreateInventoryItem,
            Self::BulkUpdateInventory { .. } => PacketKind::BulkUpdateInventory,
            Self::ReplyTaskInventory { .. } => PacketKind::ReplyTaskInventory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_strings_strip_one_trailing_nul() {
        assert_eq!(decode_field(b"Box\0"), "Box");
        assert_eq!(decode_field(b"Box"), "Box");
        assert_eq!(decode_field(b""), "");
        assert_eq!(encode_field("Box"), b"Box\0".to_vec());
        assert_eq!(decode_field(&encode_field("caf\u{e9}")), "caf\u{e9}");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(decode_field(&[0x66, 0xff, 0]), "f\u{fffd}");
    }

    #[test]
    fn packet_kind_matches_variant() {
        let packet = InboundPacket::ReplyTaskInventory {
            task_id: Uuid::nil(),
            serial: 1,
            filename: Vec::new(),
        };
        assert_eq!(packet.kind(), PacketKind::ReplyTaskInventory);
        assert_eq!(packet.kind().to_string(), "ReplyTaskInventory");
        assert_eq!(PacketKind::ALL.len(), 5);
    }
}
