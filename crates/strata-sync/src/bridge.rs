//! Blocking wrappers over callback completions.
//!
//! A [`Completer`] is handed to the callback side; the caller parks on the
//! matching [`Waiter`] until the value arrives or the timeout elapses. A
//! completion that arrives after the waiter gave up is dropped silently.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

use crate::error::{SyncError, SyncResult};
use crate::types::Completion;

/// Sending half of a bridge.
pub struct Completer<T> {
    tx: SyncSender<T>,
}

/// Receiving half of a bridge.
pub struct Waiter<T> {
    rx: Receiver<T>,
}

/// Create a connected completer/waiter pair.
pub fn bridge<T: Send>() -> (Completer<T>, Waiter<T>) {
    let (tx, rx) = mpsc::sync_channel(1);
    (Completer { tx }, Waiter { rx })
}

impl<T: Send + 'static> Completer<T> {
    /// Deliver the value. Returns `false` when the waiter is gone.
    pub fn complete(self, value: T) -> bool {
        self.tx.try_send(value).is_ok()
    }
}

impl<T: Send + 'static> Completer<SyncResult<T>> {
    /// Adapt into a [`Completion`] that forwards the request outcome.
    pub fn into_completion(self) -> Completion<T> {
        Box::new(move |result| {
            self.complete(result);
        })
    }
}

impl<T> Waiter<T> {
    /// Block until the value arrives or `timeout` elapses.
    pub fn wait(self, timeout: Duration) -> SyncResult<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) => Err(SyncError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(SyncError::Abandoned),
        }
    }
}

impl<T> Waiter<SyncResult<T>> {
    /// Wait for a forwarded request outcome, flattening the two error layers.
    pub fn wait_result(self, timeout: Duration) -> SyncResult<T> {
        self.wait(timeout)?
    }
}
