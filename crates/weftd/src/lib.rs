//! weftd — daemon internals.
//!
//! The daemon has two halves joined by a channel:
//!
//! - [`server`] — the HTTP edge. Accepts connections, converts each
//!   hyper request into a plain-data boundary message, and awaits the
//!   reply.
//! - [`worker`] — the isolated side. Owns the handler chain for the
//!   process lifetime and answers boundary messages one exchange at a
//!   time.
//!
//! [`app`] provides the built-in application handlers mounted behind
//! the static stage.

pub mod app;
pub mod server;
pub mod worker;
