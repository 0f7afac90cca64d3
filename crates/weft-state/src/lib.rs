//! weft-state — embedded key/value store for weft workers.
//!
//! Backed by [redb](https://docs.rs/redb). Application code sees a
//! namespaced async facade (`set`/`get`/`delete`/`clear`/`keys`/
//! `values`/`entries`) over a single process-wide table; each worker
//! gets its own namespace, scoped by key prefix.
//!
//! Operations are individually atomic; nothing is transactional across
//! calls. The store is `Clone + Send + Sync` (an `Arc<Database>`
//! inside) and can be shared across async tasks.

pub mod error;
pub mod store;

pub use error::{KvError, KvResult};
pub use store::{KvNamespace, KvStore};
