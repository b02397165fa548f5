use thiserror::Error;

/// Produced by `VersionFeed` implementations. Always treated as transient:
/// the cycle is abandoned and retried on the next trigger.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed transport failed: {0}")]
    Transport(String),
    #[error("feed payload malformed: {0}")]
    Malformed(String),
    #[error("feed io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CheckError {
    /// Cooperative cancellation; control flow, never logged as a failure.
    #[error("update check cancelled")]
    Cancelled,
    #[error(transparent)]
    Feed(#[from] FeedError),
}
