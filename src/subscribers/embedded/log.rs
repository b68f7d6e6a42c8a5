//! # LogWriter: events rendered through `tracing`
//!
//! A minimal subscriber that turns incoming [`Event`]s into `tracing` records.
//! Install any `tracing` subscriber (e.g. `tracing-subscriber::fmt`) to see them.
//!
//! ## Example output
//! ```text
//! INFO  run started processes=2
//! DEBUG process starting process="api"
//! WARN  process failed process="api" reason="address in use"
//! INFO  shutdown started processes=2 timeout_ms=5000
//! WARN  shutdown failed process="db" reason="context deadline exceeded"
//! INFO  all stopped errors=2
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let process = e.process.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::RunStarted => info!(processes = ?e.count, "run started"),
            EventKind::ProcessStarting => debug!(process, "process starting"),
            EventKind::ProcessExited => debug!(process, "process exited"),
            EventKind::ProcessFailed => warn!(process, reason, "process failed"),
            EventKind::RunInterrupted => info!(reason, "run interrupted"),
            EventKind::ProcessRejected => warn!(process, "registration rejected"),
            EventKind::ShutdownStarted => {
                info!(processes = ?e.count, timeout_ms = ?e.timeout_ms, "shutdown started")
            }
            EventKind::ShutdownFinished => debug!(process, "shutdown finished"),
            EventKind::ShutdownFailed => warn!(process, reason, "shutdown failed"),
            EventKind::AllStopped => info!(errors = ?e.count, "all stopped"),
            EventKind::SubscriberOverflow => {
                warn!(subscriber = process, reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = process, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
