//! # Shutdown phase: run every shutdown operation under one shared deadline.
//!
//! ## Flow
//! ```text
//! fresh root Context (independent of the run context)
//!   └─► with_timeout(shutdown_timeout)   (skipped when the timeout is 0s)
//!
//! entries ──► spawn shutdown(ctx.clone()) per entry (own tokio task, panic-guarded)
//!         ──► join ALL (no early exit) ──► errors sorted by registration order
//!         ──► cancel root (releases the deadline timer)
//! ```
//!
//! ## Rules
//! - Every shutdown operation is invoked exactly once, whatever happened before.
//! - One operation's error never cancels or affects another.
//! - The deadline is advisory: an operation ignoring it is still awaited.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::context::Context;
use crate::core::guard::{Outcome, guarded};
use crate::core::registry::Entry;
use crate::error::{Operation, ProcessError};
use crate::events::{Bus, Event, EventKind};

/// Runs every shutdown operation and collects their errors in registration order.
pub(crate) async fn shutdown_all(
    entries: &[Entry],
    timeout: Option<Duration>,
    bus: &Bus,
) -> Vec<ProcessError> {
    let root = Context::new();
    let ctx = match timeout {
        Some(d) => Context::with_timeout(&root, d),
        None => root.clone(),
    };

    let mut started = Event::new(EventKind::ShutdownStarted).with_count(entries.len());
    if let Some(d) = timeout {
        started = started.with_timeout(d);
    }
    bus.publish(started);
    debug!(processes = entries.len(), timeout = ?timeout, "shutdown started");

    let mut set = JoinSet::new();
    for entry in entries {
        let entry = entry.clone();
        let ctx = ctx.clone();
        set.spawn(async move {
            let outcome = guarded(entry.process.shutdown(ctx)).await;
            (entry, outcome)
        });
    }

    let mut errors = Vec::new();
    while let Some(joined) = set.join_next().await {
        let (entry, outcome) = match joined {
            Ok(done) => done,
            Err(err) => {
                // Only reachable when the runtime is shutting down.
                warn!(error = %err, "shutdown task did not complete");
                continue;
            }
        };

        let err = match outcome {
            Outcome::Ok => {
                bus.publish(Event::new(EventKind::ShutdownFinished).with_process(Arc::clone(&entry.name)));
                continue;
            }
            Outcome::Failed(source) => ProcessError::Shutdown {
                name: Arc::clone(&entry.name),
                source,
            },
            Outcome::Panicked(reason) => ProcessError::Panicked {
                name: Arc::clone(&entry.name),
                operation: Operation::Shutdown,
                reason,
            },
        };
        warn!(process = %entry.name, error = %err, "shutdown failed");
        bus.publish(
            Event::new(EventKind::ShutdownFailed)
                .with_process(Arc::clone(&entry.name))
                .with_reason(err.to_string()),
        );
        errors.push((entry.index, err));
    }
    root.cancel();

    errors.sort_by_key(|(index, _)| *index);
    errors.into_iter().map(|(_, err)| err).collect()
}
