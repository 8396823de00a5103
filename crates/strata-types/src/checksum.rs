//! Item checksum submitted with inventory updates.
//!
//! The server computes the same value independently and rejects updates
//! whose checksum does not match, so the field order below is part of the
//! protocol and must not change.

use uuid::Uuid;

use crate::item::ItemRecord;

const SALE_TYPE_MULTIPLIER: u32 = 0x0707_3096;

/// Fold a UUID to 32 bits by XOR-ing its four little-endian words.
pub fn fold_uuid(id: &Uuid) -> u32 {
    id.as_bytes()
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .fold(0, |acc, word| acc ^ word)
}

/// Compute the update checksum of an item. All arithmetic wraps at 32 bits.
pub fn item_checksum(item: &ItemRecord) -> u32 {
    let ids = [
        &item.asset_id,
        &item.parent_id,
        &item.id,
        &item.creator_id,
        &item.owner_id,
        &item.group_id,
    ];
    let masks = [
        item.permissions.owner_mask,
        item.permissions.next_owner_mask,
        item.permissions.everyone_mask,
        item.permissions.group_mask,
    ];

    let mut crc = ids
        .iter()
        .fold(0u32, |acc, id| acc.wrapping_add(fold_uuid(id)));
    crc = masks
        .iter()
        .fold(crc, |acc, mask| acc.wrapping_add(mask.bits()));

    crc = crc.wrapping_add(item.flags);
    crc = crc.wrapping_add(i32::from(item.inv_type.code()) as u32);
    crc = crc.wrapping_add(i32::from(item.asset_type.code()) as u32);
    crc = crc.wrapping_add(item.creation_unix() as u32);
    crc = crc.wrapping_add(item.sale_price as u32);
    crc.wrapping_add(u32::from(item.sale_type.code()).wrapping_mul(SALE_TYPE_MULTIPLIER))
}
