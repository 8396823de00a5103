use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, warn};

struct RegistryState<C> {
    last: u32,
    entries: HashMap<u32, C>,
}

/// Numeric callback ids for requests whose reply carries no natural key.
///
/// Ids come from a counter that wraps from `u32::MAX` to `0`; the first id
/// issued is `1` and `0` is an ordinary id after wraparound. If the counter
/// wraps onto an id that is still pending, the old entry is replaced and a
/// warning is logged. Collisions are not otherwise detected.
pub struct RequestRegistry<C> {
    state: Mutex<RegistryState<C>>,
}

impl<C> RequestRegistry<C> {
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// A registry whose first issued id is `last.wrapping_add(1)`.
    pub fn starting_after(last: u32) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                last,
                entries: HashMap::new(),
            }),
        }
    }

    /// Store a callback and return the id to embed in the request.
    pub fn register(&self, callback: C) -> u32 {
        let mut state = self.state.lock().expect("lock poisoned");
        state.last = state.last.wrapping_add(1);
        let id = state.last;
        if state.entries.insert(id, callback).is_some() {
            warn!(callback_id = id, "callback id reused while still pending, previous callback dropped");
        }
        debug!(callback_id = id, "callback registered");
        id
    }

    /// Store a callback under a fixed id chosen by the protocol rather than
    /// the counter. Replaces any callback already registered there.
    pub fn insert_at(&self, id: u32, callback: C) {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.entries.insert(id, callback).is_some() {
            warn!(callback_id = id, "fixed callback id still pending, previous callback dropped");
        }
    }

    /// Remove and return the callback registered under `id`.
    pub fn take(&self, id: u32) -> Option<C> {
        self.state.lock().expect("lock poisoned").entries.remove(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.state
            .lock()
            .expect("lock poisoned")
            .entries
            .contains_key(&id)
    }

    /// Number of pending callbacks accepted by `predicate`.
    pub fn count_where(&self, predicate: impl Fn(&C) -> bool) -> usize {
        self.state
            .lock()
            .expect("lock poisoned")
            .entries
            .values()
            .filter(|&callback| predicate(callback))
            .count()
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C> Default for RequestRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
