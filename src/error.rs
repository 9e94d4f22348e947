//! Error types for the slot buffer and its bindings.

use crate::SPSC::Structs::SlotToken;
use thiserror::Error;

/// Main error type for buffer, store and transport operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Admission attempted against a full buffer. Not fatal; back off and retry.
    #[error("Buffer is full ({size}/{capacity})")]
    CapacityExceeded { size: usize, capacity: usize },

    /// Retrieval attempted against an empty buffer. Not fatal; back off and retry.
    #[error("Buffer is empty")]
    BufferEmpty,

    /// A token was admitted but its payload is gone from the store.
    #[error("Payload for token {0} is missing from the store")]
    PayloadMissing(SlotToken),

    /// Connection refused, reset or timed out on the network binding.
    #[error("Transport failure: {0}")]
    TransportFailure(#[source] std::io::Error),

    /// Request or response did not follow the wire format.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON encode/decode error on the wire.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error from the payload store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Capacity must be greater than zero")]
    InvalidCapacity,

    /// The producing side has already set the termination flag.
    #[error("Buffer is closed")]
    Closed,

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A producer or consumer thread panicked.
    #[error("{0} thread panicked")]
    WorkerPanicked(&'static str),
}

/// Result type alias using BufferError.
pub type Result<T> = std::result::Result<T, BufferError>;
