//! # Cancellation contexts.
//!
//! - [`Context`] token + deadline + cause, handed to the group's run phase and
//!   to every shutdown operation;
//! - `signal` wires OS termination signals into a context.

#[allow(clippy::module_inception)]
mod context;
mod signal;

pub use context::Context;
