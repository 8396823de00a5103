use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use strata_types::{InventoryType, ItemRecord};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Notifications raised while dispatching inbound inventory packets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    /// An item arrived in a fetch reply.
    ItemReceived(ItemRecord),
    /// A folder listing fragment was applied to the local cache.
    FolderUpdated { folder_id: Uuid },
    /// An item was created or delivered into the agent's inventory,
    /// including items given by in-world objects.
    TaskItemReceived {
        item_id: Uuid,
        folder_id: Uuid,
        creator_id: Uuid,
        asset_id: Uuid,
        inv_type: InventoryType,
    },
    /// An object answered a task inventory request.
    TaskInventoryReply {
        task_id: Uuid,
        serial: i16,
        filename: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ItemReceived,
    FolderUpdated,
    TaskItemReceived,
    TaskInventoryReply,
}

impl InventoryEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ItemReceived(_) => EventKind::ItemReceived,
            Self::FolderUpdated { .. } => EventKind::FolderUpdated,
            Self::TaskItemReceived { .. } => EventKind::TaskItemReceived,
            Self::TaskInventoryReply { .. } => EventKind::TaskInventoryReply,
        }
    }
}

/// Selects a subset of inventory events.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// If set, only events of these kinds are delivered.
    pub kinds: Option<Vec<EventKind>>,
}

impl EventFilter {
    pub fn kinds(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        Self {
            kinds: Some(kinds.into_iter().collect()),
        }
    }

    pub fn matches(&self, event: &InventoryEvent) -> bool {
        self.kinds
            .as_ref()
            .map_or(true, |kinds| kinds.contains(&event.kind()))
    }
}

pub type EventStream = broadcast::Receiver<InventoryEvent>;

struct Subscriber {
    filter: EventFilter,
    sender: broadcast::Sender<InventoryEvent>,
}

/// Fans events out to filtered subscribers. Subscribers whose receivers
/// are all dropped are pruned on the next publish.
pub(crate) struct EventRouter {
    subscribers: RwLock<Vec<Subscriber>>,
    capacity: usize,
}

impl EventRouter {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn subscribe(&self, filter: EventFilter) -> EventStream {
        let (sender, rx) = broadcast::channel(self.capacity);
        self.subscribers
            .write()
            .expect("lock poisoned")
            .push(Subscriber { filter, sender });
        rx
    }

    pub(crate) fn publish(&self, event: InventoryEvent) {
        let mut subs = self.subscribers.write().expect("lock poisoned");
        if subs.is_empty() {
            return;
        }
        subs.retain(|sub| {
            if sub.filter.matches(&event) {
                sub.sender.send(event.clone()).is_ok()
            } else {
                sub.sender.receiver_count() > 0
            }
        });
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.read().expect("lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder_event() -> InventoryEvent {
        InventoryEvent::FolderUpdated {
            folder_id: Uuid::from_u128(1),
        }
    }

    #[test]
    fn filtered_subscription() {
        let router = EventRouter::new(8);
        let mut all = router.subscribe(EventFilter::default());
        let mut tasks = router.subscribe(EventFilter::kinds([EventKind::TaskInventoryReply]));

        router.publish(folder_event());
        assert_eq!(all.try_recv().unwrap(), folder_event());
        assert!(tasks.try_recv().is_err());
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let router = EventRouter::new(8);
        let rx = router.subscribe(EventFilter::default());
        assert_eq!(router.subscriber_count(), 1);
        drop(rx);
        router.publish(folder_event());
        assert_eq!(router.subscriber_count(), 0);
    }

    #[test]
    fn event_kinds() {
        let event = InventoryEvent::TaskInventoryReply {
            task_id: Uuid::nil(),
            serial: 1,
            filename: "inventory_1.tmp".into(),
        };
        assert_eq!(event.kind(), EventKind::TaskInventoryReply);
        assert!(EventFilter::default().matches(&event));
        assert!(!EventFilter::kinds([EventKind::ItemReceived]).matches(&event));
    }
}
