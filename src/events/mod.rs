//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by a group while it runs
//! its processes and shuts them down.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Group` (registration, phase transitions), `core::runner`,
//!   `core::shutdown`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the listener spawned by `Group::wait`, which fans out to
//!   `SubscriberSet`.
//!
//! See `core/mod.rs` for the system-level wiring diagram.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
