//! Conversion between wire blocks and inventory records.

use strata_protocol::{decode_field, encode_field, FolderBlock, ItemBlock};
use strata_types::{
    AssetType, FolderRecord, InventoryType, ItemRecord, PermissionMask, Permissions, SaleType,
};
use uuid::Uuid;

/// Decode an item block.
///
/// Objects attached in-world before being stored were recorded with the
/// texture inventory type; those are corrected to attachments.
pub fn item_from_block(block: &ItemBlock) -> ItemRecord {
    let asset_type = AssetType::from_code(block.asset_type);
    let mut inv_type = InventoryType::from_code(block.inv_type);
    if asset_type == AssetType::Object && inv_type == InventoryType::Texture {
        inv_type = InventoryType::Attachment;
    }

    let mut item = ItemRecord {
        id: block.item_id,
        parent_id: block.folder_id,
        name: decode_field(&block.name),
        description: decode_field(&block.description),
        owner_id: block.owner_id,
        creator_id: block.creator_id,
        group_id: block.group_id,
        group_owned: block.group_owned,
        asset_id: block.asset_id,
        asset_type,
        inv_type,
        permissions: Permissions {
            base_mask: PermissionMask::from_bits(block.base_mask),
            owner_mask: PermissionMask::from_bits(block.owner_mask),
            group_mask: PermissionMask::from_bits(block.group_mask),
            everyone_mask: PermissionMask::from_bits(block.everyone_mask),
            next_owner_mask: PermissionMask::from_bits(block.next_owner_mask),
        },
        flags: block.flags,
        sale_price: block.sale_price,
        sale_type: SaleType::from_code(block.sale_type),
        ..ItemRecord::default()
    };
    // creation dates travel as unsigned seconds in a signed field
    item.set_creation_unix(i64::from(block.creation_date as u32));
    item
}

/// Whether the block claims to describe a folder, which item replies never
/// legitimately do.
pub fn is_folder_block(block: &ItemBlock) -> bool {
    block.inv_type == InventoryType::Folder.code()
}

pub fn folder_from_block(block: &FolderBlock, owner_id: Uuid) -> FolderRecord {
    FolderRecord {
        id: block.folder_id,
        parent_id: block.parent_id,
        name: decode_field(&block.name),
        owner_id,
        preferred_type: AssetType::from_code(block.preferred_type),
        ..FolderRecord::default()
    }
}

/// Encode an item for an update-style message, with its checksum.
pub fn item_to_block(item: &ItemRecord, transaction_id: Uuid) -> ItemBlock {
    ItemBlock {
        item_id: item.id,
        folder_id: item.parent_id,
        callback_id: 0,
        transaction_id,
        creator_id: item.creator_id,
        owner_id: item.owner_id,
        group_id: item.group_id,
        asset_id: item.asset_id,
        base_mask: item.permissions.base_mask.bits(),
        owner_mask: item.permissions.owner_mask.bits(),
        group_mask: item.permissions.group_mask.bits(),
        everyone_mask: item.permissions.everyone_mask.bits(),
        next_owner_mask: item.permissions.next_owner_mask.bits(),
        group_owned: item.group_owned,
        asset_type: item.asset_type.code(),
        inv_type: item.inv_type.code(),
        flags: item.flags,
        sale_type: item.sale_type.code(),
        sale_price: item.sale_price,
        name: encode_field(&item.name),
        description: encode_field(&item.description),
        creation_date: item.creation_unix() as i32,
        crc: item.checksum(),
    }
}
