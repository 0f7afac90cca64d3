//! weft-exchange — the cross-boundary HTTP exchange core.
//!
//! Reconstructs a request envelope from a plain-data boundary message,
//! routes it through a two-stage handler chain (static assets first,
//! application handler second), and encodes the resulting response back
//! into a boundary message that survives structured transfer.
//!
//! # Architecture
//!
//! ```text
//! boundary message (plain data)
//!   │
//!   ▼
//! codec::decode → RequestEnvelope
//!   │
//!   ▼
//! HandlerChain
//!   ├── StaticFiles::serve        hit → done
//!   │     miss (not found / is a directory) → fall through
//!   │     any other failure → surface
//!   └── application handler       failure → 500 "Internal Error"
//!   │
//!   ▼
//! codec::encode → boundary message (plain data)
//! ```
//!
//! Stages run strictly in sequence and short-circuit on first success.
//! The chain is immutable after construction and shared across
//! concurrent exchanges without coordination.

pub mod cache;
pub mod chain;
pub mod codec;
pub mod static_files;

pub use cache::{CacheControl, cache_control};
pub use chain::{AppHandler, HandlerChain};
pub use static_files::StaticFiles;
