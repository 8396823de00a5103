use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for pending-request bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Pending folder listings, fetches and keyed waits older than this are
    /// failed with [`SyncError::Expired`](crate::SyncError::Expired) the next
    /// time a reply is dispatched. `None` keeps them until they complete.
    pub request_expiry: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_expiry: Some(Duration::from_secs(300)),
        }
    }
}

impl SyncConfig {
    /// Never expire pending requests.
    pub fn retain_forever() -> Self {
        Self {
            request_expiry: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_expires_after_five_minutes() {
        assert_eq!(
            SyncConfig::default().request_expiry,
            Some(Duration::from_secs(300))
        );
        assert_eq!(SyncConfig::retain_forever().request_expiry, None);
    }

    #[test]
    fn config_serializes() {
        let json = serde_json::to_string(&SyncConfig::default()).unwrap();
        let back: SyncConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SyncConfig::default());
    }
}
