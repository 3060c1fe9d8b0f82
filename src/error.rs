//! Error Types
//!
//! Set, get and delete never fail. Errors only come from configuring
//! and starting the optional background sweep.

/// Errors raised by the ambient surface of the store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("background sweep requires a running tokio runtime")]
    NoRuntime,
}

/// Result alias for fallible store setup
pub type Result<T> = std::result::Result<T, StoreError>;
