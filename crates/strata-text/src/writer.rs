use std::fmt;

use strata_types::{AssetType, FolderRecord, InventoryNode, ItemRecord};

/// Display adapter that renders one node in the canonical text layout.
///
/// Folders are written as `inv_object` records, items always as `inv_item`.
pub struct TextRecord<'a>(pub &'a InventoryNode);

impl fmt::Display for TextRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            InventoryNode::Folder(folder) => write_folder(f, folder),
            InventoryNode::Item(item) => write_item(f, item),
        }
    }
}

/// Render a single node.
pub fn to_text(node: &InventoryNode) -> String {
    TextRecord(node).to_string()
}

/// Render a sequence of nodes back to back.
///
/// Names and descriptions are written verbatim, so whitespace in them is
/// normalized by a later [`parse`](crate::parse) and leading spaces are lost.
pub fn serialize(nodes: &[InventoryNode]) -> String {
    nodes.iter().map(to_text).collect()
}

fn write_folder(f: &mut fmt::Formatter<'_>, folder: &FolderRecord) -> fmt::Result {
    f.write_str("\tinv_object\t0\n\t{\n")?;
    writeln!(f, "\t\tobj_id\t{}", folder.id)?;
    writeln!(f, "\t\tparent_id\t{}", folder.parent_id)?;
    writeln!(f, "\t\ttype\t{}", AssetType::Folder.name())?;
    writeln!(f, "\t\tname\t{}|", folder.name)?;
    f.write_str("\t}\n")
}

fn write_item(f: &mut fmt::Formatter<'_>, item: &ItemRecord) -> fmt::Result {
    let perms = &item.permissions;

    f.write_str("\tinv_item\t0\n\t{\n")?;
    writeln!(f, "\t\titem_id\t{}", item.id)?;
    writeln!(f, "\t\tparent_id\t{}", item.parent_id)?;

    f.write_str("\tpermissions 0\n\t{\n")?;
    writeln!(f, "\t\tbase_mask\t{:08x}", perms.base_mask)?;
    writeln!(f, "\t\towner_mask\t{:08x}", perms.owner_mask)?;
    writeln!(f, "\t\tgroup_mask\t{:08x}", perms.group_mask)?;
    writeln!(f, "\t\teveryone_mask\t{:08x}", perms.everyone_mask)?;
    writeln!(f, "\t\tnext_owner_mask\t{:08x}", perms.next_owner_mask)?;
    writeln!(f, "\t\tcreator_id\t{}", item.creator_id)?;
    writeln!(f, "\t\towner_id\t{}", item.owner_id)?;
    writeln!(f, "\t\tlast_owner_id\t{}", item.last_owner_id)?;
    writeln!(f, "\t\tgroup_id\t{}", item.group_id)?;
    writeln!(f, "\t\tgroup_owned\t{}", u8::from(item.group_owned))?;
    f.write_str("\t}\n")?;

    writeln!(f, "\t\tasset_id\t{}", item.asset_id)?;
    writeln!(f, "\t\ttype\t{}", item.asset_type.name())?;
    writeln!(f, "\t\tinv_type\t{}", item.inv_type.name())?;
    writeln!(f, "\t\tflags\t{:08}", item.flags)?;

    f.write_str("\tsale_info\t0\n\t{\n")?;
    writeln!(f, "\t\tsale_type\t{}", item.sale_type.name())?;
    writeln!(f, "\t\tsale_price\t{}", item.sale_price)?;
    f.write_str("\t}\n")?;

    writeln!(f, "\t\tname\t{}|", item.name)?;
    writeln!(f, "\t\tdesc\t{}|", item.description)?;
    writeln!(f, "\t\tcreation_date\t{}", item.creation_unix())?;
    f.write_str("\t}\n")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use strata_types::{InventoryType, PermissionMask, Permissions, SaleType};
    use uuid::Uuid;

    use super::*;
    use crate::parser::parse;

    fn lamp() -> ItemRecord {
        let mut item = ItemRecord::new(Uuid::from_u128(0x11), Uuid::from_u128(0x22), "Desk Lamp");
        item.description = "Warm | bright".into();
        item.asset_id = Uuid::from_u128(0xaa);
        item.creator_id = Uuid::from_u128(0xc0);
        item.owner_id = Uuid::from_u128(0xe0);
        item.asset_type = AssetType::Object;
        item.inv_type = InventoryType::Object;
        item.permissions = Permissions::owner_full();
        item.permissions.everyone_mask = PermissionMask::COPY;
        item.flags = 16;
        item.sale_type = SaleType::Copy;
        item.sale_price = 25;
        item.set_creation_unix(1_200_000_000);
        item
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    #[test]
    fn folder_layout_is_exact() {
        let folder = FolderRecord::new(Uuid::from_u128(5), Uuid::nil(), "Contents");
        let expected = "\tinv_object\t0\n\t{\n\
            \t\tobj_id\t00000000-0000-0000-0000-000000000005\n\
            \t\tparent_id\t00000000-0000-0000-0000-000000000000\n\
            \t\ttype\tcategory\n\
            \t\tname\tContents|\n\
            \t}\n";
        assert_eq!(to_text(&folder.into()), expected);
    }

    #[test]
    fn item_layout_is_exact() {
        let expected = "\tinv_item\t0\n\t{\n\
            \t\titem_id\t00000000-0000-0000-0000-000000000011\n\
            \t\tparent_id\t00000000-0000-0000-0000-000000000022\n\
            \tpermissions 0\n\t{\n\
            \t\tbase_mask\t7fffffff\n\
            \t\towner_mask\t7fffffff\n\
            \t\tgroup_mask\t00000000\n\
            \t\teveryone_mask\t00008000\n\
            \t\tnext_owner_mask\t00000000\n\
            \t\tcreator_id\t00000000-0000-0000-0000-0000000000c0\n\
            \t\towner_id\t00000000-0000-0000-0000-0000000000e0\n\
            \t\tlast_owner_id\t00000000-0000-0000-0000-000000000000\n\
            \t\tgroup_id\t00000000-0000-0000-0000-000000000000\n\
            \t\tgroup_owned\t0\n\
            \t}\n\
            \t\tasset_id\t00000000-0000-0000-0000-0000000000aa\n\
            \t\ttype\tobject\n\
            \t\tinv_type\tobject\n\
            \t\tflags\t00000016\n\
            \tsale_info\t0\n\t{\n\
            \t\tsale_type\tcopy\n\
            \t\tsale_price\t25\n\
            \t}\n\
            \t\tname\tDesk Lamp|\n\
            \t\tdesc\tWarm | bright|\n\
            \t\tcreation_date\t1200000000\n\
            \t}\n";
        assert_eq!(to_text(&lamp().into()), expected);
    }

    #[test]
    fn parse_recovers_written_item() {
        let node = InventoryNode::from(lamp());
        let parsed = parse(&to_text(&node)).unwrap();
        assert_eq!(parsed, vec![node]);
    }

    #[test]
    fn serialize_concatenates_records() {
        let nodes = vec![
            InventoryNode::from(FolderRecord::new(Uuid::from_u128(1), Uuid::nil(), "A")),
            InventoryNode::from(lamp()),
        ];
        let text = serialize(&nodes);
        assert_eq!(text.matches("\t}\n").count(), 4);
        assert_eq!(parse(&text).unwrap(), nodes);
    }

    // ------------------------------------------------------------------
    // Round trip
    // ------------------------------------------------------------------

    fn text_strategy() -> impl Strategy<Value = String> {
        "([A-Za-z0-9|.,!_-]{1,10}( [A-Za-z0-9|.,!_-]{1,10}){0,3})?"
    }

    fn asset_strategy() -> impl Strategy<Value = AssetType> {
        (-1i8..=22).prop_map(AssetType::from_code)
    }

    fn inv_strategy() -> impl Strategy<Value = InventoryType> {
        (-1i8..=20).prop_map(InventoryType::from_code)
    }

    prop_compose! {
        fn item_strategy()(
            ids in proptest::array::uniform6(any::<u128>()),
            masks in proptest::array::uniform5(any::<u32>()),
            name in text_strategy(),
            description in text_strategy(),
            asset_type in asset_strategy(),
            inv_type in inv_strategy(),
            flags in any::<u32>(),
            sale_price in any::<i32>(),
            sale_code in 0u8..4,
            group_owned in any::<bool>(),
            created in 0i64..4_000_000_000,
        ) -> ItemRecord {
            let mut item = ItemRecord::new(Uuid::from_u128(ids[0]), Uuid::from_u128(ids[1]), name);
            item.description = description;
            item.asset_id = Uuid::from_u128(ids[2]);
            item.creator_id = Uuid::from_u128(ids[3]);
            item.owner_id = Uuid::from_u128(ids[4]);
            item.group_id = Uuid::from_u128(ids[5]);
            item.permissions = Permissions {
                base_mask: PermissionMask::from_bits(masks[0]),
                owner_mask: PermissionMask::from_bits(masks[1]),
                group_mask: PermissionMask::from_bits(masks[2]),
                everyone_mask: PermissionMask::from_bits(masks[3]),
                next_owner_mask: PermissionMask::from_bits(masks[4]),
            };
            item.asset_type = asset_type;
            item.inv_type = inv_type;
            item.flags = flags;
            item.sale_price = sale_price;
            item.sale_type = SaleType::from_code(sale_code);
            item.group_owned = group_owned;
            item.set_creation_unix(created);
            item
        }
    }

    #[test]
    fn leading_space_is_dropped_once() {
        let mut item = lamp();
        item.name = " Sword".into();
        let first = to_text(&InventoryNode::from(item));
        let reparsed = parse(&first).unwrap();
        assert_eq!(reparsed[0].name(), "Sword");
        let second = serialize(&reparsed);
        assert_ne!(second, first);
        assert_eq!(serialize(&parse(&second).unwrap()), second);
    }

    #[test]
    fn unlisted_codes_write_as_unknown() {
        let mut item = lamp();
        item.inv_type = InventoryType::Other(4);
        let text = to_text(&InventoryNode::from(item));
        assert!(text.contains("\t\tinv_type\tunknown\n"));
    }

    proptest! {
        #[test]
        fn serialize_parse_serialize_is_stable(item in item_strategy()) {
            let first = to_text(&InventoryNode::from(item));
            let reparsed = parse(&first).unwrap();
            prop_assert_eq!(serialize(&reparsed), first);
        }
    }
}
