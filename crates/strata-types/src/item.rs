use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::{AssetType, InventoryType, SaleType};
use crate::checksum::item_checksum;
use crate::permissions::Permissions;

/// A single inventory item.
///
/// Equality is field-wise: two records with the same `id` but different
/// metadata are not equal, so a stale copy never compares equal to a fresh
/// one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: Uuid,
    /// Folder that contains this item.
    pub parent_id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub creator_id: Uuid,
    pub last_owner_id: Uuid,
    pub group_id: Uuid,
    pub group_owned: bool,
    /// Referenced content; nil for items without an asset.
    pub asset_id: Uuid,
    pub asset_type: AssetType,
    pub inv_type: InventoryType,
    pub permissions: Permissions,
    pub flags: u32,
    pub sale_price: i32,
    pub sale_type: SaleType,
    pub creation_date: DateTime<Utc>,
}

impl ItemRecord {
    /// A minimal item with only identity, location and name set.
    pub fn new(id: Uuid, parent_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creation date as whole seconds since the UNIX epoch.
    pub fn creation_unix(&self) -> i64 {
        self.creation_date.timestamp()
    }

    /// Set the creation date from whole seconds since the UNIX epoch.
    /// Out-of-range values fall back to the epoch.
    pub fn set_creation_unix(&mut self, secs: i64) {
        self.creation_date = DateTime::from_timestamp(secs, 0).unwrap_or_default();
    }

    /// Checksum submitted alongside item updates.
    pub fn checksum(&self) -> u32 {
        item_checksum(self)
    }
}

/// An inventory folder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    /// Asset type this folder receives by default; `Unknown` for plain folders.
    pub preferred_type: AssetType,
    /// Incremented by the server whenever the folder's contents change.
    pub version: i32,
    /// Direct children (items and folders) as last reported by the server.
    pub descendent_count: i32,
}

impl FolderRecord {
    pub fn new(id: Uuid, parent_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Either an item or a folder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InventoryNode {
    Item(ItemRecord),
    Folder(FolderRecord),
}

impl InventoryNode {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Item(item) => item.id,
            Self::Folder(folder) => folder.id,
        }
    }

    pub fn parent_id(&self) -> Uuid {
        match self {
            Self::Item(item) => item.parent_id,
            Self::Folder(folder) => folder.parent_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Item(item) => &item.name,
            Self::Folder(folder) => &folder.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }

    pub fn as_item(&self) -> Option<&ItemRecord> {
        match self {
            Self::Item(item) => Some(item),
            Self::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderRecord> {
        match self {
            Self::Folder(folder) => Some(folder),
            Self::Item(_) => None,
        }
    }
}

impl From<ItemRecord> for InventoryNode {
    fn from(item: ItemRecord) -> Self {
        Self::Item(item)
    }
}

impl From<FolderRecord> for InventoryNode {
    fn from(folder: FolderRecord) -> Self {
        Self::Folder(folder)
    }
}

/// Root folder and top-level folders received at session start.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySkeleton {
    pub root_id: Uuid,
    pub owner_id: Uuid,
    pub folders: Vec<FolderRecord>,
}

impl InventorySkeleton {
    /// Default destination folder for new content of the given type.
    ///
    /// Plain folders go under the root. Otherwise the first top-level folder
    /// whose preferred type matches wins, falling back to the root.
    pub fn folder_for_type(&self, asset_type: AssetType) -> Uuid {
        if asset_type == AssetType::Folder {
            return self.root_id;
        }
        self.folders
            .iter()
            .find(|f| f.preferred_type == asset_type)
            .map_or(self.root_id, |f| f.id)
    }
}
