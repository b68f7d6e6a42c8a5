//! # Subscriber trait
//!
//! [`Subscribe`] is how callers observe a group: every lifecycle [`Event`]
//! is handed to each subscriber on a worker task of its own, fed by a
//! bounded queue that the [`SubscriberSet`](crate::SubscriberSet) owns.
//!
//! ## Contract
//! - A slow subscriber delays only itself; neither the group nor other
//!   subscribers wait for it.
//! - When its queue ([`Subscribe::queue_capacity`]) is full, new events are
//!   dropped for that subscriber and a `SubscriberOverflow` event is published.
//! - `Group::wait` drains every queue before returning, so the final
//!   [`EventKind::AllStopped`](crate::EventKind::AllStopped) is always seen.

use async_trait::async_trait;

use crate::events::Event;

/// Receives lifecycle events from a group.
///
/// Runs on a dedicated worker task; prefer async I/O over blocking calls.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name used in logs and in overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue (min 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
