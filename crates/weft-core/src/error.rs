//! Error taxonomy for a single exchange.

use thiserror::Error;

/// Result type alias for exchange operations.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Errors that can occur while decoding, serving, or encoding one exchange.
///
/// The two asset-miss variants are fallback triggers: the handler chain
/// consumes them and moves on to the application handler. Everything else
/// is terminal for the exchange. Application-handler failures are not
/// represented here — the chain converts them into a 500 envelope before
/// they can reach the boundary.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The boundary message could not be decoded into a request envelope.
    /// Fatal for the exchange: no well-formed response is possible without
    /// a parseable request.
    #[error("malformed exchange: {0}")]
    Malformed(String),

    /// No file exists at the resolved static path.
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// The resolved static path names a directory, not a file.
    #[error("asset is a directory: {0}")]
    AssetIsDirectory(String),

    /// Any other I/O failure from the static stage (permissions, device
    /// errors). Surfaced as-is, never a fallback trigger.
    #[error("asset read failed: {path}: {source}")]
    AssetIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExchangeError {
    /// True exactly for the conditions that make the chain fall through
    /// to the application handler.
    pub fn is_fallback_trigger(&self) -> bool {
        matches!(
            self,
            ExchangeError::AssetNotFound(_) | ExchangeError::AssetIsDirectory(_)
        )
    }
}
