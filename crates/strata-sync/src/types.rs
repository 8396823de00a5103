use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_types::{FolderRecord, InventoryNode, ItemRecord};
use uuid::Uuid;

use crate::error::SyncResult;

/// One-shot completion invoked with the final outcome of a request.
pub type Completion<T> = Box<dyn FnOnce(SyncResult<T>) + Send>;

/// Progress callback for folder listings: the records carried by the packet
/// just dispatched, and how many descendants are still outstanding.
pub type PartialCallback = Arc<dyn Fn(&FolderContents, usize) + Send + Sync>;

/// Opaque identity of a pending request, unique within its tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestHandle(u64);

impl RequestHandle {
    pub(crate) fn next(counter: &AtomicU64) -> Self {
        Self(counter.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Direct children of a folder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderContents {
    pub folder_id: Uuid,
    pub folders: Vec<FolderRecord>,
    pub items: Vec<ItemRecord>,
}

impl FolderContents {
    pub fn new(folder_id: Uuid) -> Self {
        Self {
            folder_id,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.folders.len() + self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Folders first, then items, each in arrival order.
    pub fn into_nodes(self) -> Vec<InventoryNode> {
        self.folders
            .into_iter()
            .map(InventoryNode::Folder)
            .chain(self.items.into_iter().map(InventoryNode::Item))
            .collect()
    }
}
