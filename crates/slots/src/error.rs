#![forbid(unsafe_code)]

use crate::SlotKey;

/// Represents all possible errors that can occur in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A slot was requested while the capacity is not positive.
    #[error("slot capacity must be positive, got {0}")]
    InvalidCapacity(i32),

    /// Every key up to `i32::MAX` has been handed out.
    #[error("no slot keys left after {0}")]
    KeysExhausted(SlotKey),
}

/// Reasons a prefetch request is refused before reaching the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("URL must have HTTPS scheme for prefetch: {0}")]
    NotHttps(String),

    #[error("embedder initiated prefetching is not enabled")]
    FeatureDisabled,

    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid value for header {0:?}")]
    InvalidHeaderValue(String),
}

/// Failure of a single fetch performed by a [`Fetcher`](crate::Fetcher).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("response was malformed: {0}")]
    Malformed(String),
}
