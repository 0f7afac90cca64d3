//! weft-core — shared types for the weft exchange bridge.
//!
//! Defines the exchange envelopes (the live request/response
//! representation used inside the worker), the plain-data boundary
//! messages that cross the isolate boundary, the error taxonomy, and
//! the `weft.toml` configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::WeftConfig;
pub use error::{ExchangeError, ExchangeResult};
pub use types::*;
