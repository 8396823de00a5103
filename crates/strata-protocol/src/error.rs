use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("transport disconnected")]
    Disconnected,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("asset unavailable: {0}")]
    AssetUnavailable(String),

    #[error("capability request failed: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
