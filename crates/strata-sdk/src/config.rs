use std::time::Duration;

use serde::{Deserialize, Serialize};
use strata_protocol::capabilities;
use strata_sync::SyncConfig;

/// Configuration for an [`InventoryManager`](crate::InventoryManager).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Wait used by blocking helpers that take no explicit timeout.
    pub default_timeout: Duration,
    /// Pending-request bookkeeping.
    pub sync: SyncConfig,
    /// Capability used to create items from uploaded assets.
    pub upload_capability: String,
    /// Buffer size of each event subscription.
    pub event_capacity: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            sync: SyncConfig::default(),
            upload_capability: capabilities::NEW_FILE_AGENT_INVENTORY.to_string(),
            event_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = InventoryConfig::default();
        assert_eq!(config.default_timeout, Duration::from_secs(30));
        assert_eq!(config.upload_capability, "NewFileAgentInventory");
        assert_eq!(config.sync.request_expiry, Some(Duration::from_secs(300)));
    }

    #[test]
    fn partial_json_is_rejected() {
        // every field is required; callers start from Default and override
        assert!(serde_json::from_str::<InventoryConfig>(r#"{"event_capacity": 8}"#).is_err());
        let json = serde_json::to_string(&InventoryConfig::default()).unwrap();
        let back: InventoryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, InventoryConfig::default());
    }
}
