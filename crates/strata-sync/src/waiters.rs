use std::sync::atomic::AtomicU64;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::SyncError;
use crate::types::{Completion, RequestHandle};

struct KeyedWaiter<K, T> {
    handle: RequestHandle,
    key: K,
    started: Instant,
    on_complete: Completion<T>,
}

/// Waiters completed by the first reply that carries their key.
///
/// Used for replies that identify the request only by a UUID, such as a task
/// inventory reply naming the object it describes. Every waiter registered
/// under the key is completed by a single notification.
pub struct KeyedWaiters<K, T> {
    name: &'static str,
    pending: Mutex<Vec<KeyedWaiter<K, T>>>,
    handles: AtomicU64,
}

impl<K, T> KeyedWaiters<K, T>
where
    K: PartialEq + std::fmt::Debug,
    T: Clone,
{
    /// `name` labels the request kind in logs and expiry errors.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            pending: Mutex::new(Vec::new()),
            handles: AtomicU64::new(1),
        }
    }

    pub fn register(&self, key: K, on_complete: Completion<T>) -> RequestHandle {
        let handle = RequestHandle::next(&self.handles);
        debug!(kind = self.name, request = %handle, ?key, "waiter registered");
        self.pending.lock().expect("lock poisoned").push(KeyedWaiter {
            handle,
            key,
            started: Instant::now(),
            on_complete,
        });
        handle
    }

    /// Complete every waiter registered under `key`. Returns how many fired.
    pub fn notify(&self, key: &K, value: T) -> usize {
        let matched: Vec<KeyedWaiter<K, T>> = {
            let mut pending = self.pending.lock().expect("lock poisoned");
            let (hit, rest): (Vec<_>, Vec<_>) =
                std::mem::take(&mut *pending).into_iter().partition(|w| &w.key == key);
            *pending = rest;
            hit
        };
        let count = matched.len();
        for waiter in matched {
            (waiter.on_complete)(Ok(value.clone()));
        }
        count
    }

    /// Fail and drop every waiter older than `max_age`.
    pub fn prune_expired(&self, max_age: Duration) -> usize {
        let expired: Vec<KeyedWaiter<K, T>> = {
            let mut pending = self.pending.lock().expect("lock poisoned");
            let (old, live): (Vec<_>, Vec<_>) = std::mem::take(&mut *pending)
                .into_iter()
                .partition(|w| w.started.elapsed() > max_age);
            *pending = live;
            old
        };
        let count = expired.len();
        for waiter in expired {
            let age = waiter.started.elapsed();
            debug!(kind = self.name, request = %waiter.handle, ?age, "waiter expired");
            (waiter.on_complete)(Err(SyncError::Expired {
                request: self.name,
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
            debug!(kind = self.name, request = %handle, "waiter cancelled");
        }
        removed
    }

    pub fn is_pending(&self, handle: RequestHandle) -> bool {
        self.pending
            .lock()
            .expect("lock poisoned")
            .iter()
            .any(|w| w.handle == handle)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("lock poisoned").len()
    }
}
