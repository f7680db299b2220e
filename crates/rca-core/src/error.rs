use thiserror::Error;

/// Failures raised by an LLM provider adapter.
///
/// Adapters never let transport or service faults escape in any other form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The model service answered, but rejected the request (non-success status).
    #[error("Provider client error: {0}")]
    Client(String),

    /// The request never completed (connect, timeout, body read).
    #[error("Provider transport error: {0}")]
    Transport(String),

    /// The service answered successfully but produced no usable text.
    #[error("Provider returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Short stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Client(_) => "client_error",
            ProviderError::Transport(_) => "transport_error",
            ProviderError::EmptyResponse => "empty_response",
        }
    }
}

/// Service-wide error type.
#[derive(Debug, Error)]
pub enum RcaError {
    /// Incident or report not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// RCA generation failed in the provider adapter.
    #[error("Generation error: {0}")]
    Generation(#[from] ProviderError),

    /// Storage layer error (RocksDB, lock poisoning).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An incident document that cannot be interpreted.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Invalid state transition or conflicting write.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<serde_json::Error> for RcaError {
    fn from(e: serde_json::Error) -> Self {
        RcaError::Serialization(e.to_string())
    }
}
