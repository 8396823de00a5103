use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{request} request expired after {age:?} without a complete reply")]
    Expired { request: &'static str, age: Duration },

    #[error("request was dropped before completing")]
    Abandoned,
}

pub type SyncResult<T> = Result<T, SyncError>;
