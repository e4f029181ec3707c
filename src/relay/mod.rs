//! Game-session relay.
//!
//! One relay per streaming request: it consumes events from a protocol
//! connection, normalizes them into [`crate::events::RelayEvent`]s, and
//! pushes SSE frames through an [`EventSink`] whose closure is idempotent.
//!
//! # Architecture
//!
//! - [`EventSink`]: emit/close guard around the outbound channel
//! - [`derive_question`]: single priority-ordered question decision function
//! - [`run_session`]: the per-session event loop

mod derive;
mod runner;
mod sink;

pub use derive::derive_question;
pub use runner::{RelayOptions, run_session};
pub use sink::EventSink;
