//! # Runtime events emitted by a group.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Run phase**: processes starting, exiting and failing
//! - **Shutdown phase**: shutdown operations finishing or failing
//! - **Subscriber events**: delivery problems inside the fan-out
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! process name, reasons and the shutdown deadline.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use gracevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ProcessFailed)
//!     .with_process("api")
//!     .with_reason("address in use");
//!
//! assert_eq!(ev.kind, EventKind::ProcessFailed);
//! assert_eq!(ev.process.as_deref(), Some("api"));
//! assert_eq!(ev.reason.as_deref(), Some("address in use"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Run phase ===
    /// `wait` began; start operations are about to launch.
    ///
    /// Sets:
    /// - `count`: number of registered processes
    RunStarted,

    /// A start operation was launched.
    ///
    /// Sets:
    /// - `process`: process name
    ProcessStarting,

    /// A start operation returned `Ok(())` (not a shutdown trigger).
    ///
    /// Sets:
    /// - `process`: process name
    ProcessExited,

    /// A start operation failed or panicked; shutdown begins.
    ///
    /// Sets:
    /// - `process`: process name
    /// - `reason`: failure message
    ProcessFailed,

    /// The run context ended; shutdown begins.
    ///
    /// Sets:
    /// - `reason`: context cause
    RunInterrupted,

    /// A registration arrived after `wait` began and was dropped.
    ///
    /// Sets:
    /// - `process`: process name (absent for an unnamed `add`)
    /// - `reason`: why it was rejected
    ProcessRejected,

    // === Shutdown phase ===
    /// Shutdown operations are about to launch.
    ///
    /// Sets:
    /// - `count`: number of shutdown operations
    /// - `timeout_ms`: shutdown deadline, absent when unbounded
    ShutdownStarted,

    /// A shutdown operation returned `Ok(())`.
    ///
    /// Sets:
    /// - `process`: process name
    ShutdownFinished,

    /// A shutdown operation failed or panicked.
    ///
    /// Sets:
    /// - `process`: process name
    /// - `reason`: failure message
    ShutdownFailed,

    /// Every shutdown operation returned.
    ///
    /// Sets:
    /// - `count`: number of errors collected over the whole run
    AllStopped,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `process`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `process`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the process (or subscriber), if applicable.
    pub process: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Shutdown deadline in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Number of processes or errors, depending on the kind.
    pub count: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            process: None,
            reason: None,
            timeout_ms: None,
            count: None,
        }
    }

    /// Attaches a process name.
    #[inline]
    pub fn with_process(mut self, name: impl Into<Arc<str>>) -> Self {
        self.process = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_process(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_process(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
