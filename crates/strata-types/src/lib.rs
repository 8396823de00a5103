//! Inventory data model for Strata.
//!
//! This crate holds the records every other Strata crate passes around:
//! items, folders, the login skeleton, and the enumerations that give the
//! wire's numeric codes their meaning. It also owns the item checksum the
//! server uses to validate client-submitted updates.
//!
//! # Key Types
//!
//! - [`ItemRecord`] — a single inventory item with permissions and sale info
//! - [`FolderRecord`] — a folder with its server version and child count
//! - [`InventoryNode`] — either of the above, as returned by folder listings
//! - [`InventorySkeleton`] — root and top-level folders received at login
//! - [`AssetType`], [`InventoryType`], [`SaleType`] — coded enumerations
//! - [`Permissions`] / [`PermissionMask`] — the five role bitmasks

pub mod asset;
pub mod checksum;
pub mod error;
pub mod item;
pub mod permissions;

pub use asset::{AssetType, DeRezDestination, InventorySortOrder, InventoryType, SaleType};
pub use checksum::{fold_uuid, item_checksum};
pub use error::{TypeError, TypeResult};
pub use item::{FolderRecord, InventoryNode, InventorySkeleton, ItemRecord};
pub use permissions::{PermissionMask, Permissions};

pub use uuid::Uuid;
