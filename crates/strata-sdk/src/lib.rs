//! Inventory manager for Strata.
//!
//! [`InventoryManager`] is the entry point for applications: it issues
//! inventory requests through a [`Transport`](strata_protocol::Transport),
//! dispatches the replies it receives back, keeps a local cache of every
//! record it has seen, and publishes [`InventoryEvent`]s to subscribers.
//!
//! Listings, fetches, creates, path searches and task inventories come in a
//! callback form (`request_*`) and a blocking form bounded by a timeout.
//! Moves, renames, removals, rez and give are fire-and-forget.

pub mod config;
pub mod decode;
pub mod error;
pub mod event;
mod handlers;
pub mod manager;
pub mod mutate;
pub mod store;
mod task;
mod upload;
mod world;

#[cfg(test)]
mod testing;

pub use config::InventoryConfig;
pub use error::{SdkError, SdkResult};
pub use event::{EventFilter, EventKind, EventStream, InventoryEvent};
pub use manager::{
    Callback, CopyCallback, FolderQuery, InventoryManager, InventoryManagerBuilder, PendingRequests,
};
pub use mutate::{default_folder_name, ItemCopy, NewItem};
pub use store::InventoryStore;

// Re-export key types
pub use strata_protocol::{RezParams, Transport};
pub use strata_sync::{FolderContents, PartialCallback, SyncConfig};
pub use strata_types::{
    AssetType, DeRezDestination, FolderRecord, InventoryNode, InventorySkeleton, InventorySortOrder,
    InventoryType, ItemRecord, PermissionMask, Permissions, SaleType,
};
pub use uuid::Uuid;
