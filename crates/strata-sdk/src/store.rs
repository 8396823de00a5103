use std::collections::HashMap;
use std::sync::RwLock;

use strata_types::{FolderRecord, InventoryNode};
use uuid::Uuid;

/// Local cache of every inventory record the manager has seen.
///
/// Records are keyed by id; the folder tree is implied by `parent_id`.
pub struct InventoryStore {
    nodes: RwLock<HashMap<Uuid, InventoryNode>>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a record.
    pub fn insert(&self, node: impl Into<InventoryNode>) {
        let node = node.into();
        self.nodes
            .write()
            .expect("lock poisoned")
            .insert(node.id(), node);
    }

    pub fn get(&self, id: Uuid) -> Option<InventoryNode> {
        self.nodes.read().expect("lock poisoned").get(&id).cloned()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.nodes.read().expect("lock poisoned").contains_key(&id)
    }

    pub fn folder(&self, id: Uuid) -> Option<FolderRecord> {
        match self.get(id) {
            Some(InventoryNode::Folder(folder)) => Some(folder),
            _ => None,
        }
    }

    /// Direct children of `folder_id`: folders first, each group by name.
    pub fn contents(&self, folder_id: Uuid) -> Vec<InventoryNode> {
        let mut children: Vec<InventoryNode> = self
            .nodes
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|n| n.parent_id() == folder_id && n.id() != folder_id)
            .cloned()
            .collect();
        children.sort_by(|a, b| {
            b.is_folder()
                .cmp(&a.is_folder())
                .then_with(|| a.name().cmp(b.name()))
                .then_with(|| a.id().cmp(&b.id()))
        });
        children
    }

    /// Remove a record and everything below it. Returns how many records
    /// were removed.
    pub fn remove(&self, id: Uuid) -> usize {
        let mut nodes = self.nodes.write().expect("lock poisoned");
        let mut doomed = vec![id];
        let mut removed = 0;
        while let Some(next) = doomed.pop() {
            if nodes.remove(&next).is_some() {
                removed += 1;
            }
            doomed.extend(
                nodes
                    .values()
                    .filter(|n| n.parent_id() == next && n.id() != next)
                    .map(InventoryNode::id),
            );
        }
        removed
    }

    /// Apply `edit` to the cached record, if present.
    pub fn update(&self, id: Uuid, edit: impl FnOnce(&mut InventoryNode)) -> bool {
        match self.nodes.write().expect("lock poisoned").get_mut(&id) {
            Some(node) => {
                edit(node);
                true
            }
            None => false,
        }
    }

    /// Record a folder's server version and child count.
    ///
    /// Returns `false`, leaving the cache untouched, when the folder is not
    /// cached or `version` is older than the cached one.
    pub fn update_folder_version(&self, folder_id: Uuid, version: i32, descendents: i32) -> bool {
        let mut nodes = self.nodes.write().expect("lock poisoned");
        match nodes.get_mut(&folder_id) {
            Some(InventoryNode::Folder(folder)) if version >= folder.version => {
                folder.version = version;
                folder.descendent_count = descendents;
                true
            }
            _ => false,
        }
    }

    /// Resolve `path` one name per level below `base`, using only cached
    /// records. Intermediate levels only descend into folders.
    pub fn local_find(&self, base: Uuid, path: &[&str], first_only: bool) -> Vec<InventoryNode> {
        let mut found = Vec::new();
        self.find_level(base, path, first_only, &mut found);
        found
    }

    fn find_level(&self, base: Uuid, path: &[&str], first_only: bool, found: &mut Vec<InventoryNode>) {
        let Some((name, rest)) = path.split_first() else {
            return;
        };
        for node in self.contents(base) {
            if node.name() != *name {
                continue;
            }
            if rest.is_empty() {
                found.push(node);
            } else if node.is_folder() {
                self.find_level(node.id(), rest, first_only, found);
            }
            if first_only && !found.is_empty() {
                return;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InventoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use strata_types::ItemRecord;

    use super::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    /// root(1) / Objects(2) / Boxes(3) / Crate item(4); Lamp item(5) in Objects.
    fn sample() -> InventoryStore {
        let store = InventoryStore::new();
        store.insert(FolderRecord::new(id(1), Uuid::nil(), "My Inventory"));
        store.insert(FolderRecord::new(id(2), id(1), "Objects"));
        store.insert(FolderRecord::new(id(3), id(2), "Boxes"));
        store.insert(ItemRecord::new(id(4), id(3), "Crate"));
        store.insert(ItemRecord::new(id(5), id(2), "Lamp"));
        store
    }

    #[test]
    fn contents_lists_folders_first() {
        let store = sample();
        let names: Vec<_> = store.contents(id(2)).iter().map(|n| n.name().to_string()).collect();
        assert_eq!(names, vec!["Boxes", "Lamp"]);
        assert!(store.contents(id(4)).is_empty());
    }

    #[test]
    fn remove_takes_descendants() {
        let store = sample();
        assert_eq!(store.remove(id(2)), 4);
        assert_eq!(store.len(), 1);
        assert_eq!(store.remove(id(99)), 0);
    }

    #[test]
    fn outdated_version_is_ignored() {
        let store = sample();
        assert!(store.update_folder_version(id(2), 5, 2));
        assert!(!store.update_folder_version(id(2), 4, 7));
        let folder = store.folder(id(2)).unwrap();
        assert_eq!((folder.version, folder.descendent_count), (5, 2));
        assert!(!store.update_folder_version(id(4), 9, 0), "items have no version");
    }

    #[test]
    fn local_find_walks_folders() {
        let store = sample();
        let hits = store.local_find(id(1), &["Objects", "Boxes", "Crate"], true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), id(4));
        assert!(store.local_find(id(1), &["Objects", "Lamp", "Crate"], false).is_empty());
        assert!(store.local_find(id(1), &[], false).is_empty());
    }

    #[test]
    fn update_edits_in_place() {
        let store = sample();
        assert!(store.update(id(5), |node| {
            if let InventoryNode::Item(item) = node {
                item.parent_id = id(3);
            }
        }));
        assert_eq!(store.contents(id(3)).len(), 2);
        assert!(!store.update(id(42), |_| {}));
    }
}
