use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Kind of content an asset holds.
///
/// The numeric code travels on the wire; the short name is used by the
/// bracketed text format embedded in task inventories and notecards.
/// Wire codes outside the table are kept as [`AssetType::Other`] so they
/// are sent back unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    #[default]
    Unknown,
    Texture,
    Sound,
    CallingCard,
    Landmark,
    Script,
    Clothing,
    Object,
    Notecard,
    /// A plain folder. Records of this type are folders, never items.
    Folder,
    RootFolder,
    LslText,
    LslBytecode,
    TextureTga,
    Bodypart,
    TrashFolder,
    SnapshotFolder,
    LostAndFoundFolder,
    SoundWav,
    ImageTga,
    ImageJpeg,
    Animation,
    Gesture,
    Simstate,
    /// A wire code with no entry in the table.
    Other(i8),
}

const ASSET_TYPES: &[(AssetType, i8, &str)] = &[
    (AssetType::Unknown, -1, "unknown"),
    (AssetType::Texture, 0, "texture"),
    (AssetType::Sound, 1, "sound"),
    (AssetType::CallingCard, 2, "callcard"),
    (AssetType::Landmark, 3, "landmark"),
    (AssetType::Script, 4, "script"),
    (AssetType::Clothing, 5, "clothing"),
    (AssetType::Object, 6, "object"),
    (AssetType::Notecard, 7, "notecard"),
    (AssetType::Folder, 8, "category"),
    (AssetType::RootFolder, 9, "root"),
    (AssetType::LslText, 10, "lsltext"),
    (AssetType::LslBytecode, 11, "lslbyte"),
    (AssetType::TextureTga, 12, "txtr_tga"),
    (AssetType::Bodypart, 13, "bodypart"),
    (AssetType::TrashFolder, 14, "trash"),
    (AssetType::SnapshotFolder, 15, "snapshot"),
    (AssetType::LostAndFoundFolder, 16, "lstndfnd"),
    (AssetType::SoundWav, 17, "snd_wav"),
    (AssetType::ImageTga, 18, "img_tga"),
    (AssetType::ImageJpeg, 19, "jpeg"),
    (AssetType::Animation, 20, "animatn"),
    (AssetType::Gesture, 21, "gesture"),
    (AssetType::Simstate, 22, "simstate"),
];

impl AssetType {
    /// Wire code of this asset type.
    pub fn code(self) -> i8 {
        if let Self::Other(code) = self {
            return code;
        }
        ASSET_TYPES
            .iter()
            .find(|(t, _, _)| *t == self)
            .map_or(-1, |(_, code, _)| *code)
    }

    /// Short name used by the text format.
    pub fn name(self) -> &'static str {
        ASSET_TYPES
            .iter()
            .find(|(t, _, _)| *t == self)
            .map_or("unknown", |(_, _, name)| name)
    }

    /// Lenient lookup: unrecognized codes become [`AssetType::Other`].
    pub fn from_code(code: i8) -> Self {
        Self::try_from(code).unwrap_or(Self::Other(code))
    }

    /// Lenient lookup: unrecognized names become [`AssetType::Unknown`].
    pub fn from_name(name: &str) -> Self {
        ASSET_TYPES
            .iter()
            .find(|(_, _, n)| *n == name)
            .map_or(Self::Unknown, |(t, _, _)| *t)
    }

    /// Returns `true` for the types that describe folders rather than content.
    pub fn is_folder_kind(self) -> bool {
        matches!(
            self,
            Self::Folder
                | Self::RootFolder
                | Self::TrashFolder
                | Self::SnapshotFolder
                | Self::LostAndFoundFolder
        )
    }
}

impl TryFrom<i8> for AssetType {
    type Error = TypeError;

    fn try_from(code: i8) -> TypeResult<Self> {
        ASSET_TYPES
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(t, _, _)| *t)
            .ok_or(TypeError::UnknownCode {
                kind: "asset type",
                code: code.into(),
            })
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical kind of an inventory item.
///
/// Distinct from [`AssetType`]: one asset kind may back several item kinds,
/// for example an object asset backing either an object or an attachment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InventoryType {
    #[default]
    Unknown,
    Texture,
    Sound,
    CallingCard,
    Landmark,
    Object,
    Notecard,
    Folder,
    RootFolder,
    Script,
    Snapshot,
    Attachment,
    Wearable,
    Animation,
    Gesture,
    /// A wire code with no entry in the table.
    Other(i8),
}

const INVENTORY_TYPES: &[(InventoryType, i8, &str)] = &[
    (InventoryType::Unknown, -1, "unknown"),
    (InventoryType::Texture, 0, "texture"),
    (InventoryType::Sound, 1, "sound"),
    (InventoryType::CallingCard, 2, "callcard"),
    (InventoryType::Landmark, 3, "landmark"),
    (InventoryType::Object, 6, "object"),
    (InventoryType::Notecard, 7, "notecard"),
    (InventoryType::Folder, 8, "category"),
    (InventoryType::RootFolder, 9, "root"),
    (InventoryType::Script, 10, "script"),
    (InventoryType::Snapshot, 15, "snapshot"),
    (InventoryType::Attachment, 17, "attach"),
    (InventoryType::Wearable, 18, "wearable"),
    (InventoryType::Animation, 19, "animation"),
    (InventoryType::Gesture, 20, "gesture"),
];

impl InventoryType {
    pub fn code(self) -> i8 {
        if let Self::Other(code) = self {
            return code;
        }
        INVENTORY_TYPES
            .iter()
            .find(|(t, _, _)| *t == self)
            .map_or(-1, |(_, code, _)| *code)
    }

    pub fn name(self) -> &'static str {
        INVENTORY_TYPES
            .iter()
            .find(|(t, _, _)| *t == self)
            .map_or("unknown", |(_, _, name)| name)
    }

    /// Lenient lookup: unrecognized codes become [`InventoryType::Other`].
    pub fn from_code(code: i8) -> Self {
        Self::try_from(code).unwrap_or(Self::Other(code))
    }

    pub fn from_name(name: &str) -> Self {
        INVENTORY_TYPES
            .iter()
            .find(|(_, _, n)| *n == name)
            .map_or(Self::Unknown, |(t, _, _)| *t)
    }
}

impl TryFrom<i8> for InventoryType {
    type Error = TypeError;

    fn try_from(code: i8) -> TypeResult<Self> {
        INVENTORY_TYPES
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(t, _, _)| *t)
            .ok_or(TypeError::UnknownCode {
                kind: "inventory type",
                code: code.into(),
            })
    }
}

impl fmt::Display for InventoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether and how an item may be purchased.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleType {
    /// Not for sale.
    #[default]
    Not,
    /// The original is sold.
    Original,
    /// A copy is sold.
    Copy,
    /// The contents of the object are sold.
    Contents,
}

const SALE_TYPES: &[(SaleType, u8, &str)] = &[
    (SaleType::Not, 0, "not"),
    (SaleType::Original, 1, "orig"),
    (SaleType::Copy, 2, "copy"),
    (SaleType::Contents, 3, "cntn"),
];

impl SaleType {
    pub fn code(self) -> u8 {
        SALE_TYPES
            .iter()
            .find(|(t, _, _)| *t == self)
            .map_or(0, |(_, code, _)| *code)
    }

    pub fn name(self) -> &'static str {
        SALE_TYPES
            .iter()
            .find(|(t, _, _)| *t == self)
            .map_or("not", |(_, _, name)| name)
    }

    /// Unrecognized codes are treated as not-for-sale.
    pub fn from_code(code: u8) -> Self {
        Self::try_from(code).unwrap_or_default()
    }

    /// Unrecognized names are treated as not-for-sale.
    pub fn from_name(name: &str) -> Self {
        SALE_TYPES
            .iter()
            .find(|(_, _, n)| *n == name)
            .map_or(Self::Not, |(t, _, _)| *t)
    }
}

impl TryFrom<u8> for SaleType {
    type Error = TypeError;

    fn try_from(code: u8) -> TypeResult<Self> {
        SALE_TYPES
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(t, _, _)| *t)
            .ok_or(TypeError::UnknownCode {
                kind: "sale type",
                code: code.into(),
            })
    }
}

impl fmt::Display for SaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sort flags carried by folder listing requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventorySortOrder(u32);

impl InventorySortOrder {
    pub const BY_NAME: Self = Self(0);
    pub const BY_DATE: Self = Self(1);
    pub const FOLDERS_BY_NAME: Self = Self(2);
    pub const SYSTEM_FOLDERS_TO_TOP: Self = Self(4);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for InventorySortOrder {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Where an in-world object goes when it is taken back into inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DeRezDestination {
    AgentInventorySave = 0,
    AgentInventoryCopy = 1,
    TaskInventory = 2,
    Attachment = 3,
    AgentInventoryTake = 4,
    ForceToGodInventory = 5,
    TrashFolder = 6,
    AttachmentToInventory = 7,
    AttachmentExists = 8,
    ReturnToOwner = 9,
    ReturnToLastOwner = 10,
}

impl DeRezDestination {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------
    // AssetType
    // ------------------------------------------------------------------

    #[test]
    fn asset_codes_and_names_agree() {
        for (t, code, name) in ASSET_TYPES {
            assert_eq!(t.code(), *code);
            assert_eq!(t.name(), *name);
            assert_eq!(AssetType::from_code(*code), *t);
            assert_eq!(AssetType::from_name(name), *t);
        }
    }

    #[test]
    fn folder_asset_is_named_category() {
        assert_eq!(AssetType::Folder.code(), 8);
        assert_eq!(AssetType::from_name("category"), AssetType::Folder);
    }

    #[test]
    fn unknown_asset_code_is_kept_but_try_from_fails() {
        assert_eq!(AssetType::from_code(24), AssetType::Other(24));
        assert_eq!(AssetType::from_code(24).code(), 24);
        assert_eq!(AssetType::Other(24).name(), "unknown");
        assert_eq!(AssetType::from_code(-1), AssetType::Unknown);
        assert_eq!(
            AssetType::try_from(99i8),
            Err(TypeError::UnknownCode {
                kind: "asset type",
                code: 99
            })
        );
        assert_eq!(AssetType::from_name("hologram"), AssetType::Unknown);
    }

    #[test]
    fn system_folders_are_folder_kinds() {
        assert!(AssetType::TrashFolder.is_folder_kind());
        assert!(AssetType::Folder.is_folder_kind());
        assert!(!AssetType::Notecard.is_folder_kind());
    }

    // ------------------------------------------------------------------
    // InventoryType / SaleType
    // ------------------------------------------------------------------

    #[test]
    fn inventory_type_gaps_keep_their_code() {
        for code in [4i8, 5, 11, 12, 13, 14, 16] {
            assert_eq!(InventoryType::from_code(code), InventoryType::Other(code));
            assert_eq!(InventoryType::from_code(code).code(), code);
        }
        assert_eq!(InventoryType::from_code(17), InventoryType::Attachment);
        assert_eq!(InventoryType::Attachment.name(), "attach");
    }

    #[test]
    fn sale_type_names() {
        assert_eq!(SaleType::from_name("cntn"), SaleType::Contents);
        assert_eq!(SaleType::Original.to_string(), "orig");
        assert_eq!(SaleType::from_name("bogus"), SaleType::Not);
        assert_eq!(SaleType::from_code(2), SaleType::Copy);
    }

    // ------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------

    #[test]
    fn sort_order_combines() {
        let order = InventorySortOrder::BY_DATE | InventorySortOrder::SYSTEM_FOLDERS_TO_TOP;
        assert_eq!(order.bits(), 5);
        assert!(order.contains(InventorySortOrder::BY_DATE));
        assert!(!order.contains(InventorySortOrder::FOLDERS_BY_NAME));
    }

    #[test]
    fn derez_codes() {
        assert_eq!(DeRezDestination::TrashFolder.code(), 6);
        assert_eq!(DeRezDestination::ReturnToLastOwner.code(), 10);
    }
}
