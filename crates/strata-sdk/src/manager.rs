use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strata_protocol::{
    AssetFetch, CapsClient, FetchEntry, OutboundMessage, PacketHandler, PacketKind, Transport,
};
use strata_sync::{
    bridge, DescendantsAggregator, FetchCorrelator, FolderContents, KeyedWaiters,
    PartialCallback, RequestRegistry, SyncError,
};
use strata_types::{
    AssetType, InventoryNode, InventorySkeleton, InventorySortOrder, ItemRecord,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::InventoryConfig;
use crate::error::{SdkError, SdkResult};
use crate::event::{EventFilter, EventRouter, EventStream, InventoryEvent};
use crate::store::InventoryStore;

/// Completion for a single request.
pub type Callback<T> = Box<dyn FnOnce(SdkResult<T>) + Send>;

/// Invoked once per item produced by a copy request.
pub type CopyCallback = Arc<dyn Fn(SdkResult<ItemRecord>) + Send + Sync>;

/// A caller callback claimable by either the reply path or the send-failure
/// path; whichever comes first invokes it.
pub(crate) struct OneShot<T>(Arc<Mutex<Option<Callback<T>>>>);

impl<T> OneShot<T> {
    pub(crate) fn new(callback: Callback<T>) -> Self {
        Self(Arc::new(Mutex::new(Some(callback))))
    }

    pub(crate) fn fire(&self, result: SdkResult<T>) {
        let callback = self.0.lock().expect("lock poisoned").take();
        if let Some(callback) = callback {
            callback(result);
        }
    }
}

/// A create or copy completion waiting for an update-create reply. Both
/// kinds share one callback id space.
pub(crate) enum ItemReply {
    Created(Callback<ItemRecord>),
    Copied(CopyCallback),
}

impl ItemReply {
    pub(crate) fn complete(self, result: SdkResult<ItemRecord>) {
        match self {
            ItemReply::Created(callback) => callback(result),
            ItemReply::Copied(callback) => callback(result),
        }
    }

    fn is_copy(&self) -> bool {
        matches!(self, ItemReply::Copied(_))
    }
}

impl<T> Clone for OneShot<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// Parameters of a folder listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderQuery {
    pub folder_id: Uuid,
    pub owner_id: Uuid,
    pub fetch_folders: bool,
    pub fetch_items: bool,
    pub sort_order: InventorySortOrder,
}

impl FolderQuery {
    /// Folders and items, sorted by name.
    pub fn new(folder_id: Uuid, owner_id: Uuid) -> Self {
        Self {
            folder_id,
            owner_id,
            fetch_folders: true,
            fetch_items: true,
            sort_order: InventorySortOrder::BY_NAME,
        }
    }

    pub fn items_only(mut self) -> Self {
        self.fetch_folders = false;
        self
    }

    pub fn sorted(mut self, order: InventorySortOrder) -> Self {
        self.sort_order = order;
        self
    }
}

/// Counts of requests still waiting for a reply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequests {
    pub listings: usize,
    pub fetches: usize,
    pub creates: usize,
    pub copies: usize,
    pub task_inventories: usize,
}

/// Client-side inventory engine for one agent.
///
/// Outbound requests go through the [`Transport`]; replies come back on the
/// transport's dispatch thread through [`PacketHandler`] and complete the
/// callbacks registered by the call that issued the request. Every request
/// that takes a callback has a blocking twin bounded by a timeout. Blocking
/// calls must not be made from the dispatch thread.
pub struct InventoryManager {
    pub(crate) agent_id: Uuid,
    pub(crate) config: InventoryConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) assets: Option<Arc<dyn AssetFetch>>,
    pub(crate) caps: Option<Arc<dyn CapsClient>>,
    pub(crate) store: InventoryStore,
    skeleton: RwLock<Option<InventorySkeleton>>,
    pub(crate) item_replies: RequestRegistry<ItemReply>,
    pub(crate) listings: DescendantsAggregator,
    pub(crate) fetches: FetchCorrelator,
    /// Keyed by object id; completes with the inventory asset filename.
    pub(crate) task_replies: KeyedWaiters<Uuid, String>,
    pub(crate) events: EventRouter,
}

pub struct InventoryManagerBuilder {
    agent_id: Uuid,
    transport: Arc<dyn Transport>,
    assets: Option<Arc<dyn AssetFetch>>,
    caps: Option<Arc<dyn CapsClient>>,
    config: InventoryConfig,
}

impl InventoryManagerBuilder {
    pub fn assets(mut self, assets: Arc<dyn AssetFetch>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn caps(mut self, caps: Arc<dyn CapsClient>) -> Self {
        self.caps = Some(caps);
        self
    }

    pub fn config(mut self, config: InventoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the manager and subscribe it to every inventory packet kind.
    pub fn build(self) -> Arc<InventoryManager> {
        let manager = Arc::new(InventoryManager {
            agent_id: self.agent_id,
            events: EventRouter::new(self.config.event_capacity),
            config: self.config,
            transport: self.transport,
            assets: self.assets,
            caps: self.caps,
            store: InventoryStore::new(),
            skeleton: RwLock::new(None),
            item_replies: RequestRegistry::new(),
            listings: DescendantsAggregator::new(),
            fetches: FetchCorrelator::new(),
            task_replies: KeyedWaiters::new("task inventory"),
        });
        let weak: Weak<InventoryManager> = Arc::downgrade(&manager);
        for kind in PacketKind::ALL {
            let handler: Weak<dyn PacketHandler> = weak.clone();
            manager.transport.register_handler(kind, handler);
        }
        manager
    }
}

impl InventoryManager {
    pub fn builder(agent_id: Uuid, transport: Arc<dyn Transport>) -> InventoryManagerBuilder {
        InventoryManagerBuilder {
            agent_id,
            transport,
            assets: None,
            caps: None,
            config: InventoryConfig::default(),
        }
    }

    pub fn agent_id(&self) -> Uuid {
        self.agent_id
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Local cache of records seen so far.
    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    pub fn subscribe(&self, filter: EventFilter) -> EventStream {
        self.events.subscribe(filter)
    }

    pub fn pending_requests(&self) -> PendingRequests {
        PendingRequests {
            listings: self.listings.pending_count(),
            fetches: self.fetches.pending_count(),
            creates: self.item_replies.count_where(|reply| !reply.is_copy()),
            copies: self.item_replies.count_where(ItemReply::is_copy),
            task_inventories: self.task_replies.pending_count(),
        }
    }

    pub(crate) fn send(&self, message: OutboundMessage) -> SdkResult<()> {
        self.transport.send(message)?;
        Ok(())
    }

    pub(crate) fn publish(&self, event: InventoryEvent) {
        self.events.publish(event);
    }

    // ---- Skeleton ----

    /// Install the folder skeleton received at login and cache its folders.
    pub fn set_skeleton(&self, skeleton: InventorySkeleton) {
        for folder in &skeleton.folders {
            self.store.insert(folder.clone());
        }
        debug!(root = %skeleton.root_id, folders = skeleton.folders.len(), "inventory skeleton loaded");
        *self.skeleton.write().expect("lock poisoned") = Some(skeleton);
    }

    pub fn root_folder(&self) -> Option<Uuid> {
        self.skeleton
            .read()
            .expect("lock poisoned")
            .as_ref()
            .map(|s| s.root_id)
    }

    /// Folder that receives new content of `asset_type` by default.
    ///
    /// Searches top-level folders for a matching preferred type and falls
    /// back to the root. Nil when no skeleton has been loaded.
    pub fn find_folder_for_type(&self, asset_type: AssetType) -> Uuid {
        let guard = self.skeleton.read().expect("lock poisoned");
        let Some(skeleton) = guard.as_ref() else {
            warn!(%asset_type, "no inventory skeleton, cannot resolve folder for type");
            return Uuid::nil();
        };
        if asset_type == AssetType::Folder {
            return skeleton.root_id;
        }
        self.store
            .contents(skeleton.root_id)
            .iter()
            .filter_map(InventoryNode::as_folder)
            .find(|f| f.preferred_type == asset_type)
            .map_or_else(|| skeleton.folder_for_type(asset_type), |f| f.id)
    }

    /// Top-level folder with the given preferred type, if any.
    pub(crate) fn system_folder(&self, preferred: AssetType) -> Option<Uuid> {
        let root = self.root_folder()?;
        self.store
            .contents(root)
            .iter()
            .filter_map(InventoryNode::as_folder)
            .find(|f| f.preferred_type == preferred)
            .map(|f| f.id)
    }

    // ---- Folder listings ----

    /// List a folder's direct children. `on_partial` sees each reply packet
    /// as it arrives together with the number of children still missing.
    pub fn request_folder_contents(
        &self,
        query: FolderQuery,
        on_complete: Callback<Vec<InventoryNode>>,
        on_partial: Option<PartialCallback>,
    ) {
        let callback = OneShot::new(on_complete);
        let reply = callback.clone();
        let handle = self.listings.begin(
            query.folder_id,
            Box::new(move |result| {
                reply.fire(result.map(FolderContents::into_nodes).map_err(SdkError::from));
            }),
            on_partial,
        );
        let sent = self.send(OutboundMessage::FetchInventoryDescendents {
            folder_id: query.folder_id,
            owner_id: query.owner_id,
            sort_order: query.sort_order,
            fetch_folders: query.fetch_folders,
            fetch_items: query.fetch_items,
        });
        if let Err(err) = sent {
            self.listings.cancel(handle);
            callback.fire(Err(err));
        }
    }

    pub fn folder_contents(&self, query: FolderQuery, timeout: Duration) -> SdkResult<Vec<InventoryNode>> {
        let (completer, waiter) = bridge();
        self.request_folder_contents(
            query,
            Box::new(move |result| {
                completer.complete(result);
            }),
            None,
        );
        waiter.wait(timeout)?
    }

    // ---- Item fetches ----

    /// Fetch items by id. `owner_ids` pairs with `item_ids` one to one.
    pub fn request_fetch_items(
        &self,
        item_ids: &[Uuid],
        owner_ids: &[Uuid],
        on_complete: Callback<Vec<ItemRecord>>,
    ) {
        if item_ids.is_empty() {
            return on_complete(Err(SdkError::InvalidRequest("no items to fetch".into())));
        }
        if item_ids.len() != owner_ids.len() {
            return on_complete(Err(SdkError::InvalidRequest(format!(
                "{} item ids but {} owner ids",
                item_ids.len(),
                owner_ids.len()
            ))));
        }

        let callback = OneShot::new(on_complete);
        let reply = callback.clone();
        let handle = self.fetches.begin(
            item_ids.iter().copied(),
            Box::new(move |result| reply.fire(result.map_err(SdkError::from))),
        );
        let entries = item_ids
            .iter()
            .zip(owner_ids)
            .map(|(&item_id, &owner_id)| FetchEntry { item_id, owner_id })
            .collect();
        if let Err(err) = self.send(OutboundMessage::FetchInventory { entries }) {
            self.fetches.cancel(handle);
            callback.fire(Err(err));
        }
    }

    pub fn request_fetch_item(&self, item_id: Uuid, owner_id: Uuid, on_complete: Callback<ItemRecord>) {
        self.request_fetch_items(
            &[item_id],
            &[owner_id],
            Box::new(move |result| {
                on_complete(result.and_then(|items| {
                    items
                        .into_iter()
                        .next()
                        .ok_or(SdkError::Sync(SyncError::Abandoned))
                }))
            }),
        );
    }

    pub fn fetch_items(
        &self,
        item_ids: &[Uuid],
        owner_ids: &[Uuid],
        timeout: Duration,
    ) -> SdkResult<Vec<ItemRecord>> {
        let (completer, waiter) = bridge();
        self.request_fetch_items(
            item_ids,
            owner_ids,
            Box::new(move |result| {
                completer.complete(result);
            }),
        );
        waiter.wait(timeout)?
    }

    pub fn fetch_item(&self, item_id: Uuid, owner_id: Uuid, timeout: Duration) -> SdkResult<ItemRecord> {
        let (completer, waiter) = bridge();
        self.request_fetch_item(
            item_id,
            owner_id,
            Box::new(move |result| {
                completer.complete(result);
            }),
        );
        waiter.wait(timeout)?
    }

    // ---- Path search ----

    /// Resolve a `/`-separated path below `base`, one folder listing per
    /// level. Completes with `None` when some level has no match.
    pub fn request_find_object_by_path(
        self: &Arc<Self>,
        base: Uuid,
        owner_id: Uuid,
        path: &str,
        on_complete: Callback<Option<Uuid>>,
    ) {
        if path.is_empty() {
            return on_complete(Err(SdkError::InvalidRequest("empty path".into())));
        }
        let segments: Arc<[String]> = path.split('/').map(str::to_string).collect();
        self.search_level(base, owner_id, segments, 0, on_complete);
    }

    fn search_level(
        self: &Arc<Self>,
        folder_id: Uuid,
        owner_id: Uuid,
        path: Arc<[String]>,
        level: usize,
        on_complete: Callback<Option<Uuid>>,
    ) {
        let manager = Arc::downgrade(self);
        self.request_folder_contents(
            FolderQuery::new(folder_id, owner_id),
            Box::new(move |result| {
                let nodes = match result {
                    Ok(nodes) => nodes,
                    Err(err) => return on_complete(Err(err)),
                };
                let last = level + 1 == path.len();
                let hit = nodes
                    .iter()
                    .find(|n| n.name() == path[level] && (last || n.is_folder()))
                    .map(InventoryNode::id);
                match hit {
                    None => on_complete(Ok(None)),
                    Some(id) if last => {
                        debug!(path = %path.join("/"), found = %id, "path search finished");
                        on_complete(Ok(Some(id)))
                    }
                    Some(id) => {
                        debug!(path = %path.join("/"), level, "path search matched level");
                        match manager.upgrade() {
                            Some(manager) => manager.search_level(id, owner_id, path, level + 1, on_complete),
                            None => on_complete(Err(SdkError::Sync(SyncError::Abandoned))),
                        }
                    }
                }
            }),
            None,
        );
    }

    pub fn find_object_by_path(
        self: &Arc<Self>,
        base: Uuid,
        owner_id: Uuid,
        path: &str,
        timeout: Duration,
    ) -> SdkResult<Option<Uuid>> {
        let (completer, waiter) = bridge();
        self.request_find_object_by_path(
            base,
            owner_id,
            path,
            Box::new(move |result| {
                completer.complete(result);
            }),
        );
        waiter.wait(timeout)?
    }

    /// Cached-only path lookup.
    pub fn local_find(&self, base: Uuid, path: &str, first_only: bool) -> Vec<InventoryNode> {
        let segments: Vec<&str> = path.split('/').collect();
        self.store.local_find(base, &segments, first_only)
    }
}
