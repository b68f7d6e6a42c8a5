//! # Lifecycle event bus.
//!
//! [`Bus`] wraps a [`tokio::sync::broadcast`] channel. The run phase, the
//! shutdown phase, the [`Group`](crate::Group) itself and the subscriber
//! workers all publish into it; the only receiver is the listener that
//! `Group::wait` spawns when subscribers are configured.
//!
//! ```text
//! Group / runner / shutdown / SubscriberSet ──publish──► Bus ──► listener ──► SubscriberSet::emit
//! ```
//!
//! Publishing never blocks and never fails. With no receiver the event is
//! discarded; a receiver that falls more than `capacity` events behind sees
//! `RecvError::Lagged(n)`.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle to the event channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus holding at most `capacity` undelivered events (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes `ev` to every current receiver.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Returns a receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(Event::new(EventKind::RunStarted).with_count(2));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::RunStarted);
        assert_eq!(ev.count, Some(2));
    }

    #[test]
    fn test_late_receiver_misses_earlier_events() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::RunStarted));

        let mut rx = bus.subscribe();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_slow_receiver_lags() {
        let bus = Bus::new(1);
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::ShutdownStarted));
        bus.publish(Event::new(EventKind::AllStopped));

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::AllStopped);
    }
}
