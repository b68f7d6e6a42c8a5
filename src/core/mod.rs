//! Group core: registration, run phase and shutdown phase.
//!
//! The public API from this module is [`Group`] (with its [`GroupBuilder`])
//! and the lifecycle [`Phase`].
//!
//! Internal modules:
//! - [`registry`]: ordered, append-only list of processes plus the group phase;
//! - [`runner`]: launches start operations and waits for the first terminal condition;
//! - [`shutdown`]: runs every shutdown operation under one shared deadline;
//! - [`guard`]: panic isolation for user operations;
//! - [`group`]: ties the phases together and feeds subscribers.

mod builder;
mod group;
mod guard;
mod registry;
mod runner;
mod shutdown;

pub use builder::GroupBuilder;
pub use group::Group;
pub use registry::Phase;

pub(crate) use guard::panic_message;
