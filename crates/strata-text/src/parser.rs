use std::iter::Peekable;

use strata_types::{
    AssetType, FolderRecord, InventoryNode, InventoryType, ItemRecord, PermissionMask, SaleType,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{TextError, TextResult};
use crate::line::{Line, LineReader};

type Lines<'a> = Peekable<LineReader<'a>>;

/// A brace-delimited block: its tag line, its fields, and nested blocks,
/// each kept in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    pub tag: String,
    /// 1-based line number of the tag line.
    pub line: usize,
    pub fields: Vec<(String, String)>,
    pub children: Vec<Block>,
}

impl Block {
    /// Last value recorded under `key`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, tag: &str) -> Option<&Block> {
        self.children.iter().find(|b| b.tag == tag)
    }
}

/// Parse every record in `text`.
///
/// Unknown top-level lines are logged and skipped. Structural damage inside
/// a record is returned as an error.
pub fn parse(text: &str) -> TextResult<Vec<InventoryNode>> {
    let mut lines = LineReader::new(text).peekable();
    let mut nodes = Vec::new();

    while let Some((number, line)) = lines.next() {
        match line.key.as_str() {
            "inv_object" => {
                let block = read_block(&mut lines, number, line)?;
                nodes.push(object_from_block(&block));
            }
            "inv_item" => {
                let block = read_block(&mut lines, number, line)?;
                nodes.push(InventoryNode::Item(item_from_block(&block)));
            }
            other => warn!(line = number, token = other, "unrecognized inventory token"),
        }
    }

    debug!(count = nodes.len(), "parsed inventory text");
    Ok(nodes)
}

/// Like [`parse`], but logs structural errors and returns `None`.
pub fn try_parse(text: &str) -> Option<Vec<InventoryNode>> {
    match parse(text) {
        Ok(nodes) => Some(nodes),
        Err(e) => {
            warn!(error = %e, "failed to parse inventory text");
            None
        }
    }
}

/// Read the block introduced by `header`, consuming its closing brace.
///
/// A line immediately followed by `{` opens a nested block, which is read
/// recursively before the outer block continues.
fn read_block(lines: &mut Lines<'_>, number: usize, header: Line) -> TextResult<Block> {
    match lines.next() {
        Some((_, line)) if line.is_open() => {}
        Some((found_at, line)) => {
            return Err(TextError::ExpectedOpenBrace {
                line: found_at,
                tag: header.key,
                found: line.key,
            })
        }
        None => {
            return Err(TextError::UnexpectedEof {
                line: number,
                tag: header.key,
            })
        }
    }

    let mut block = Block {
        tag: header.key,
        line: number,
        ..Block::default()
    };

    loop {
        let Some((n, line)) = lines.next() else {
            return Err(TextError::UnexpectedEof {
                line: block.line,
                tag: block.tag,
            });
        };
        if line.is_close() {
            return Ok(block);
        }
        let opens_block = matches!(lines.peek(), Some((_, next)) if next.is_open());
        if opens_block {
            let child = read_block(lines, n, line)?;
            block.children.push(child);
        } else {
            block.fields.push((line.key, line.value));
        }
    }
}

fn object_from_block(block: &Block) -> InventoryNode {
    let id = uuid_field(block, "obj_id");
    let parent_id = uuid_field(block, "parent_id");
    let name = text_field(block, "name");
    let asset_type = block
        .field("type")
        .map(AssetType::from_name)
        .unwrap_or_default();

    if asset_type == AssetType::Folder {
        InventoryNode::Folder(FolderRecord::new(id, parent_id, name))
    } else {
        let mut item = ItemRecord::new(id, parent_id, name);
        item.asset_type = asset_type;
        InventoryNode::Item(item)
    }
}

fn item_from_block(block: &Block) -> ItemRecord {
    let mut item = ItemRecord::new(
        uuid_field(block, "item_id"),
        uuid_field(block, "parent_id"),
        text_field(block, "name"),
    );
    item.description = text_field(block, "desc");
    item.asset_id = uuid_field(block, "asset_id");
    item.asset_type = block
        .field("type")
        .map(AssetType::from_name)
        .unwrap_or_default();
    item.inv_type = block
        .field("inv_type")
        .map(InventoryType::from_name)
        .unwrap_or_default();
    item.flags = block.field("flags").map(parse_flags).unwrap_or(0);
    if let Some(secs) = block.field("creation_date") {
        item.set_creation_unix(parse_or_default("creation_date", secs));
    }

    if let Some(perms) = block.child("permissions") {
        let base = perms.field("base_mask").or_else(|| perms.field("creator_mask"));
        item.permissions.base_mask = base.map(parse_mask).unwrap_or_default();
        item.permissions.owner_mask = mask_field(perms, "owner_mask");
        item.permissions.group_mask = mask_field(perms, "group_mask");
        item.permissions.everyone_mask = mask_field(perms, "everyone_mask");
        item.permissions.next_owner_mask = mask_field(perms, "next_owner_mask");
        item.creator_id = uuid_field(perms, "creator_id");
        item.owner_id = uuid_field(perms, "owner_id");
        item.last_owner_id = uuid_field(perms, "last_owner_id");
        item.group_id = uuid_field(perms, "group_id");
        item.group_owned = perms.field("group_owned").is_some_and(parse_bool);
    }

    if let Some(sale) = block.child("sale_info") {
        item.sale_type = sale
            .field("sale_type")
            .map(SaleType::from_name)
            .unwrap_or_default();
        item.sale_price = sale
            .field("sale_price")
            .map(|v| parse_or_default("sale_price", v))
            .unwrap_or(0);
    }

    item
}

// ----------------------------------------------------------------------
// Field helpers
// ----------------------------------------------------------------------

fn uuid_field(block: &Block, key: &str) -> Uuid {
    block
        .field(key)
        .map(|v| parse_or_default(key, v))
        .unwrap_or_default()
}

/// Free text is terminated by the last `|`; text without one is taken whole.
fn text_field(block: &Block, key: &str) -> String {
    let raw = block.field(key).unwrap_or_default();
    match raw.rfind('|') {
        Some(end) => raw[..end].to_string(),
        None => raw.to_string(),
    }
}

fn mask_field(block: &Block, key: &str) -> PermissionMask {
    block.field(key).map(parse_mask).unwrap_or_default()
}

fn parse_mask(value: &str) -> PermissionMask {
    match u32::from_str_radix(value, 16) {
        Ok(bits) => PermissionMask::from_bits(bits),
        Err(e) => {
            debug!(value, error = %e, "bad permission mask");
            PermissionMask::NONE
        }
    }
}

fn parse_flags(value: &str) -> u32 {
    if let Ok(flags) = value.parse() {
        return flags;
    }
    let hex = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u32::from_str_radix(hex, 16).unwrap_or_else(|e| {
        debug!(value, error = %e, "bad flags");
        0
    })
}

fn parse_bool(value: &str) -> bool {
    match value {
        "1" | "true" | "True" => true,
        other => other.parse::<u32>().is_ok_and(|v| v != 0),
    }
}

fn parse_or_default<T>(key: &str, value: &str) -> T
where
    T: std::str::FromStr + Default,
    T::Err: std::fmt::Display,
{
    value.parse().unwrap_or_else(|e: T::Err| {
        debug!(key, value, error = %e, "unparseable field, using default");
        T::default()
    })
}
