//! Error types for the key/value store.

use thiserror::Error;

/// Result type alias for store operations.
pub type KvResult<T> = Result<T, KvError>;

/// Errors that can occur during key/value store operations.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),
}
