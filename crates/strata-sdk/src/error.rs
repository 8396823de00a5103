use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("capability not available: {0}")]
    MissingCapability(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("sync error: {0}")]
    Sync(#[from] strata_sync::SyncError),

    #[error("protocol error: {0}")]
    Protocol(#[from] strata_protocol::ProtocolError),

    #[error("text format error: {0}")]
    Text(#[from] strata_text::TextError),
}

pub type SdkResult<T> = Result<T, SdkError>;

impl SdkError {
    /// Returns `true` if a blocking call gave up waiting.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Sync(strata_sync::SyncError::Timeout(_)))
    }
}
