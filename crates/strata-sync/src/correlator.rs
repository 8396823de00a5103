use std::sync::atomic::AtomicU64;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use strata_types::ItemRecord;
use tracing::debug;
use uuid::Uuid;

use crate::error::SyncError;
use crate::types::{Completion, RequestHandle};

struct FetchRequest {
    handle: RequestHandle,
    started: Instant,
    /// Requested ids in request order; duplicates collapse to one slot.
    slots: IndexMap<Uuid, Option<ItemRecord>>,
    resolved: usize,
    on_complete: Completion<Vec<ItemRecord>>,
}

impl FetchRequest {
    /// Fill the slot for `item` if it is requested and still empty.
    fn resolve(&mut self, item: &ItemRecord) -> bool {
        match self.slots.get_mut(&item.id) {
            Some(slot) if slot.is_none() => {
                *slot = Some(item.clone());
                self.resolved += 1;
                true
            }
            _ => false,
        }
    }

    fn is_complete(&self) -> bool {
        self.resolved == self.slots.len()
    }

    fn into_items(self) -> (Completion<Vec<ItemRecord>>, Vec<ItemRecord>) {
        let items = self.slots.into_values().flatten().collect();
        (self.on_complete, items)
    }
}

/// Completes batch item fetches once every requested item has arrived.
///
/// A resolved item is offered to every pending batch, so overlapping
/// batches from independent callers are all satisfied by one reply. Items
/// nobody asked for are ignored.
pub struct FetchCorrelator {
    pending: Mutex<Vec<FetchRequest>>,
    handles: AtomicU64,
}

impl FetchCorrelator {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            handles: AtomicU64::new(1),
        }
    }

    /// Start tracking a batch. An empty batch completes immediately.
    pub fn begin(
        &self,
        ids: impl IntoIterator<Item = Uuid>,
        on_complete: Completion<Vec<ItemRecord>>,
    ) -> RequestHandle {
        let handle = RequestHandle::next(&self.handles);
        let slots: IndexMap<Uuid, Option<ItemRecord>> = ids.into_iter().map(|id| (id, None)).collect();
        if slots.is_empty() {
            on_complete(Ok(Vec::new()));
            return handle;
        }
        debug!(request = %handle, count = slots.len(), "item fetch started");
        self.pending.lock().expect("lock poisoned").push(FetchRequest {
            handle,
            started: Instant::now(),
            slots,
            resolved: 0,
            on_complete,
        });
        handle
    }

    /// Offer a resolved item to every pending batch. Returns how many
    /// batches it completed.
    pub fn on_item_resolved(&self, item: &ItemRecord) -> usize {
        let finished: Vec<FetchRequest> = {
            let mut pending = self.pending.lock().expect("lock poisoned");
            let mut finished = Vec::new();
            let mut i = 0;
            while i < pending.len() {
                if pending[i].resolve(item) && pending[i].is_complete() {
                    finished.push(pending.remove(i));
                } else {
                    i += 1;
                }
            }
            finished
        };

        let completed = finished.len();
        for request in finished {
            debug!(request = %request.handle, "item fetch complete");
            let (on_complete, items) = request.into_items();
            on_complete(Ok(items));
        }
        completed
    }

    /// Fail and drop every batch older than `max_age`.
    pub fn prune_expired(&self, max_age: Duration) -> usize {
        let expired: Vec<FetchRequest> = {
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
            debug!(request = %request.handle, resolved = request.resolved, ?age, "item fetch expired");
            (request.on_complete)(Err(SyncError::Expired {
                request: "item fetch",
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
            debug!(request = %handle, "item fetch cancelled");
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

impl Default for FetchCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use proptest::prelude::*;

    use super::*;
    use crate::error::SyncResult;

    type Outcomes = Arc<Mutex<Vec<SyncResult<Vec<ItemRecord>>>>>;

    fn recorder() -> (Outcomes, Completion<Vec<ItemRecord>>) {
        let outcomes: Outcomes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&outcomes);
        (outcomes, Box::new(move |r| sink.lock().unwrap().push(r)))
    }

    fn item(n: u128) -> ItemRecord {
        ItemRecord::new(Uuid::from_u128(n), Uuid::nil(), format!("item{n}"))
    }

    #[test]
    fn completes_after_all_resolved_in_request_order() {
        let correlator = FetchCorrelator::new();
        let (done, on_complete) = recorder();
        correlator.begin([Uuid::from_u128(1), Uuid::from_u128(2)], on_complete);

        assert_eq!(correlator.on_item_resolved(&item(2)), 0);
        assert!(done.lock().unwrap().is_empty());
        assert_eq!(correlator.on_item_resolved(&item(1)), 1);

        let done = done.lock().unwrap();
        let names: Vec<_> = done[0].as_ref().unwrap().iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, vec!["item1", "item2"]);
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn duplicate_ids_collapse() {
        let correlator = FetchCorrelator::new();
        let (done, on_complete) = recorder();
        let one = Uuid::from_u128(1);
        correlator.begin([one, one], on_complete);
        correlator.on_item_resolved(&item(1));
        assert_eq!(done.lock().unwrap()[0].as_ref().unwrap().len(), 1);
    }

    #[test]
    fn repeated_reply_does_not_double_count() {
        let correlator = FetchCorrelator::new();
        let (done, on_complete) = recorder();
        correlator.begin([Uuid::from_u128(1), Uuid::from_u128(2)], on_complete);
        correlator.on_item_resolved(&item(1));
        correlator.on_item_resolved(&item(1));
        assert!(done.lock().unwrap().is_empty());
    }

    #[test]
    fn one_reply_satisfies_overlapping_batches() {
        let correlator = FetchCorrelator::new();
        let (a, on_a) = recorder();
        let (b, on_b) = recorder();
        correlator.begin([Uuid::from_u128(1)], on_a);
        correlator.begin([Uuid::from_u128(1)], on_b);
        assert_eq!(correlator.on_item_resolved(&item(1)), 2);
        assert_eq!(a.lock().unwrap().len(), 1);
        assert_eq!(b.lock().unwrap().len(), 1);
    }

    #[test]
    fn partial_batch_stays_registered() {
        let correlator = FetchCorrelator::new();
        let (done, on_complete) = recorder();
        let handle = correlator.begin([Uuid::from_u128(1), Uuid::from_u128(2)], on_complete);
        correlator.on_item_resolved(&item(2));
        assert!(correlator.is_pending(handle));
        assert!(done.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_batch_completes_immediately() {
        let correlator = FetchCorrelator::new();
        let (done, on_complete) = recorder();
        correlator.begin(Vec::<Uuid>::new(), on_complete);
        assert!(done.lock().unwrap()[0].as_ref().unwrap().is_empty());
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn cancelled_batch_ignores_replies() {
        let correlator = FetchCorrelator::new();
        let (done, on_complete) = recorder();
        let handle = correlator.begin([Uuid::from_u128(1)], on_complete);
        assert!(correlator.cancel(handle));
        assert_eq!(correlator.on_item_resolved(&item(1)), 0);
        assert!(done.lock().unwrap().is_empty());
    }

    #[test]
    fn expired_batches_fail() {
        let correlator = FetchCorrelator::new();
        let (done, on_complete) = recorder();
        correlator.begin([Uuid::from_u128(1)], on_complete);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(correlator.prune_expired(Duration::from_millis(1)), 1);
        assert!(matches!(
            done.lock().unwrap()[0],
            Err(SyncError::Expired { request: "item fetch", .. })
        ));
    }

    proptest! {
        #[test]
        fn fires_once_only_after_every_id(k in 1u128..8, noise in proptest::collection::vec(100u128..200, 0..5)) {
            let correlator = FetchCorrelator::new();
            let (done, on_complete) = recorder();
            correlator.begin((1..=k).map(Uuid::from_u128), on_complete);

            for n in &noise {
                correlator.on_item_resolved(&item(*n));
            }
            for n in 1..=k {
                prop_assert!(done.lock().unwrap().is_empty());
                correlator.on_item_resolved(&item(n));
            }
            let done = done.lock().unwrap();
            prop_assert_eq!(done.len(), 1);
            prop_assert_eq!(done[0].as_ref().unwrap().len() as u128, k);
        }
    }
}
