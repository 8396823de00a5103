//! Request correlation for the Strata inventory engine.
//!
//! Inventory replies arrive asynchronously, possibly fragmented across many
//! packets, and carry only small integer or UUID keys. The types here turn
//! them back into one completion per request:
//!
//! - [`RequestRegistry`] hands out numeric callback ids for create and copy
//!   requests and returns the callback when the reply echoes the id.
//! - [`DescendantsAggregator`] reassembles multi-packet folder listings.
//! - [`FetchCorrelator`] completes a batch item fetch once every requested
//!   item has been resolved.
//! - [`KeyedWaiters`] completes every waiter registered under a key.
//! - [`bridge`] turns any callback completion into a timeout-bounded
//!   blocking call.
//!
//! Every collection is guarded by its own mutex and user callbacks always
//! run after the lock is released, so a callback may issue new requests.

pub mod aggregator;
pub mod bridge;
pub mod config;
pub mod correlator;
pub mod error;
pub mod registry;
pub mod types;
pub mod waiters;

pub use aggregator::DescendantsAggregator;
pub use bridge::{bridge, Completer, Waiter};
pub use config::SyncConfig;
pub use correlator::FetchCorrelator;
pub use error::{SyncError, SyncResult};
pub use registry::RequestRegistry;
pub use types::{Completion, FolderContents, PartialCallback, RequestHandle};
pub use waiters::KeyedWaiters;
