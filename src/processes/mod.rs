//! # Process abstractions.
//!
//! This module provides the process-related types:
//! - [`Process`] - trait pairing a start operation with its shutdown operation
//! - [`ProcessFn`] - closure-backed process implementation
//! - [`ProcessRef`] - shared reference to a process (`Arc<dyn Process>`)

mod process;
mod process_fn;

pub use process::{Process, ProcessRef};
pub use process_fn::ProcessFn;
