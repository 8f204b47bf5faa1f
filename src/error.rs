//! Error types for DrishtiIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DrishtiIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Resources used before the connection lifecycle initialized them
    #[error("Resources not initialized")]
    NotInitialized,

    /// Hardware power-up failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Peer vanished (radio-level disconnect detected mid-operation)
    #[error("Peer disconnected")]
    Disconnected,

    /// Camera could not deliver a frame
    #[error("Frame capture failed: {0}")]
    CaptureFailed(String),

    /// Chunk buffer could not be allocated
    #[error("Chunk allocation failed ({0} bytes)")]
    ChunkAlloc(usize),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
