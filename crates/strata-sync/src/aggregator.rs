use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use strata_types::{FolderRecord, ItemRecord};
use tracing::debug;
use uuid::Uuid;

use crate::error::SyncError;
use crate::types::{Completion, FolderContents, PartialCallback, RequestHandle};

/// One outstanding folder listing.
struct DescendentsRequest {
    handle: RequestHandle,
    started: Instant,
    /// `None` until the first reply has been seen.
    expected: Option<usize>,
    contents: FolderContents,
    on_complete: Completion<FolderContents>,
    on_partial: Option<PartialCallback>,
}

impl DescendentsRequest {
    fn absorb(&mut self, descendents: i32, items: &[ItemRecord], folders: &[FolderRecord]) {
        let declared = usize::try_from(descendents).unwrap_or(0);
        match self.expected {
            None => self.expected = Some(declared),
            // later fragments only refine a known total
            Some(_) if declared > 0 => self.expected = Some(declared),
            Some(_) => {}
        }
        self.contents.items.extend_from_slice(items);
        self.contents.folders.extend_from_slice(folders);
    }

    fn remaining(&self) -> usize {
        self.expected
            .unwrap_or(0)
            .saturating_sub(self.contents.len())
    }

    fn is_complete(&self) -> bool {
        self.expected.is_some() && self.contents.len() >= self.expected.unwrap_or(0)
    }
}

/// Reassembles multi-packet folder listings.
///
/// Each request moves from "no reply yet" to "accumulating" on its first
/// packet, and is removed when the number of accumulated records reaches the
/// total the server declared. Requests for the same folder accumulate
/// independently and each completes on its own.
pub struct DescendantsAggregator {
    pending: Mutex<Vec<DescendentsRequest>>,
    handles: AtomicU64,
}

impl DescendantsAggregator {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            handles: AtomicU64::new(1),
        }
    }

    /// Start tracking a listing of `folder_id`.
    pub fn begin(
        &self,
        folder_id: Uuid,
        on_complete: Completion<FolderContents>,
        on_partial: Option<PartialCallback>,
    ) -> RequestHandle {
        let handle = RequestHandle::next(&self.handles);
        let request = DescendentsRequest {
            handle,
            started: Instant::now(),
            expected: None,
            contents: FolderContents::new(folder_id),
            on_complete,
            on_partial,
        };
        self.pending.lock().expect("lock poisoned").push(request);
        debug!(folder = %folder_id, request = %handle, "folder listing started");
        handle
    }

    /// Feed one listing packet. Returns how many requests it completed.
    ///
    /// A nil id in the first item or folder entry is the server's way of
    /// saying the packet carries none of that kind.
    pub fn on_packet(
        &self,
        folder_id: Uuid,
        descendents: i32,
        mut items: Vec<ItemRecord>,
        mut folders: Vec<FolderRecord>,
    ) -> usize {
        if items.first().is_some_and(|item| item.id.is_nil()) {
            items.clear();
        }
        if folders.first().is_some_and(|folder| folder.id.is_nil()) {
            folders.clear();
        }

        let mut partials = Vec::new();
        let mut finished = Vec::new();
        {
            let mut pending = self.pending.lock().expect("lock poisoned");
            let mut i = 0;
            while i < pending.len() {
                if pending[i].contents.folder_id != folder_id {
                    i += 1;
                    continue;
                }
                let request = &mut pending[i];
                request.absorb(descendents, &items, &folders);
                if let Some(partial) = &request.on_partial {
                    partials.push((Arc::clone(partial), request.remaining()));
                }
                if request.is_complete() {
                    finished.push(pending.remove(i));
                } else {
                    i += 1;
                }
            }
        }

        let slice = FolderContents {
            folder_id,
            folders,
            items,
        };
        for (partial, remaining) in partials {
            partial(&slice, remaining);
        }

        let completed = finished.len();
        for request in finished {
            debug!(
                folder = %folder_id,
                request = %request.handle,
                count = request.contents.len(),
                "folder listing complete"
            );
            (request.on_complete)(Ok(request.contents));
        }
        completed
    }

    /// Fail and drop every request older than `max_age`.
    pub fn prune_expired(&self, max_age: Duration) -> usize {
        let expired: Vec<DescendentsRequest> = {
            let mut pending = self.pending.lock().expect("lock poisoned");
            let (old, live): (Vec<_>, Vec<_>) = std::mem::take(&mut *pending)
                .into_iter()
                .partition(|r| r.started.elapsed() > max_age);
            *pending = live;
            old
        };
        let count = expired.len();
        for request in expired {
            let age = request.started.elapsed();
            debug!(folder = %request.contents.folder_id, request = %request.handle, ?age, "folder listing expired");
            (request.on_complete)(Err(SyncError::Expired {
                request: "folder listing",
                age,
            }));
        }
        count
    }

    /// Drop a pending request without invoking its completion. Returns
    /// `false` if it already completed or expired.
    pub fn cancel(&self, handle: RequestHandle) -> bool {
        let mut pending = self.pending.lock().expect("lock poisoned");
        let before = pending.len();
        pending.retain(|r| r.handle != handle);
        let removed = pending.len() != before;
        if removed {
            debug!(request = %handle, "folder listing cancelled");
        }
        removed
    }

    pub fn is_pending(&self, handle: RequestHandle) -> bool {
        self.pending
            .lock()
            .expect("lock poisoned")
            .iter()
            .any(|r| r.handle == handle)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("lock poisoned").len()
    }
}

impl Default for DescendantsAggregator {
    fn default() -> Self {
        Self::new()
    }
}
