//! # Run phase: launch every start operation and wait for the first terminal condition.
//!
//! ## Flow
//! ```text
//! entries ──► spawn start() per entry (own tokio task, panic-guarded)
//!
//! race (failures polled first):
//!   ├─ start() → Err / panic        ─► Some(ProcessError::Start / Panicked)
//!   ├─ every start() → Ok           ─► context cause unless plain cancel
//!   └─ context done                 ─► context cause unless plain cancel
//!
//! afterwards: still-running start tasks are detached (never aborted)
//! ```
//!
//! ## Rules
//! - A start operation returning `Ok(())` is **not** terminal; the phase keeps waiting.
//! - Plain [`ContextError::Canceled`](crate::ContextError::Canceled) is a voluntary stop
//!   and contributes no error.
//! - Any other context cause (deadline, custom cause) becomes the run-phase error.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::context::Context;
use crate::core::guard::{Outcome, guarded};
use crate::core::registry::Entry;
use crate::error::{Operation, ProcessError};
use crate::events::{Bus, Event, EventKind};

/// What ended the run phase.
enum RunEnd {
    Failed(ProcessError),
    Completed,
    Interrupted,
}

/// Launches every start operation and returns the run-phase error, if any.
///
/// Returns as soon as the first start operation fails or `ctx` ends. Start
/// operations still running at that point keep running on their own tasks.
pub(crate) async fn wait_started(
    entries: &[Entry],
    ctx: &Context,
    bus: &Bus,
) -> Option<ProcessError> {
    let mut set = JoinSet::new();
    for entry in entries {
        let entry = entry.clone();
        bus.publish(Event::new(EventKind::ProcessStarting).with_process(Arc::clone(&entry.name)));
        set.spawn(async move {
            let outcome = guarded(entry.process.start()).await;
            (entry, outcome)
        });
    }

    let first_failure = async {
        while let Some(joined) = set.join_next().await {
            let (entry, outcome) = match joined {
                Ok(done) => done,
                Err(err) => {
                    // Only reachable when the runtime is shutting down.
                    warn!(error = %err, "start task did not complete");
                    continue;
                }
            };
            match outcome {
                Outcome::Ok => {
                    debug!(process = %entry.name, "process exited");
                    bus.publish(Event::new(EventKind::ProcessExited).with_process(Arc::clone(&entry.name)));
                }
                Outcome::Failed(source) => {
                    let err = ProcessError::Start {
                        name: entry.name,
                        source,
                    };
                    return Some(err);
                }
                Outcome::Panicked(reason) => {
                    return Some(ProcessError::Panicked {
                        name: entry.name,
                        operation: Operation::Start,
                        reason,
                    });
                }
            }
        }
        None
    };

    let end = tokio::select! {
        biased;
        failure = first_failure => failure.map_or(RunEnd::Completed, RunEnd::Failed),
        _ = ctx.done() => RunEnd::Interrupted,
    };
    set.detach_all();

    match end {
        RunEnd::Failed(err) => {
            warn!(process = ?err.process(), error = %err, "process failed, shutting down");
            let mut ev = Event::new(EventKind::ProcessFailed).with_reason(err.to_string());
            if let Some(name) = err.process() {
                ev = ev.with_process(name);
            }
            bus.publish(ev);
            Some(err)
        }
        RunEnd::Completed => {
            debug!("every process exited");
            context_error(ctx)
        }
        RunEnd::Interrupted => {
            let err = context_error(ctx);
            let reason = ctx.err().map_or_else(|| "canceled".to_string(), |c| c.to_string());
            debug!(reason = %reason, "run context ended, shutting down");
            bus.publish(Event::new(EventKind::RunInterrupted).with_reason(reason));
            err
        }
    }
}

/// Maps the context cause to a run-phase error; plain cancellation is not an error.
fn context_error(ctx: &Context) -> Option<ProcessError> {
    ctx.err()
        .filter(|cause| !cause.is_canceled())
        .map(ProcessError::Context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use crate::error::ContextError;
    use crate::processes::{ProcessFn, ProcessRef};

    #[derive(Debug, thiserror::Error)]
    #[error("bind failed")]
    struct BindFailed;

    fn entry(index: usize, process: ProcessRef) -> Entry {
        Entry {
            index,
            name: Arc::from(process.name()),
            process,
        }
    }

    fn sleeper(name: &'static str, dur: Duration) -> ProcessRef {
        ProcessFn::arc(
            name,
            move || async move {
                tokio::time::sleep(dur).await;
                Ok(())
            },
            |_ctx: Context| async { Ok(()) },
        )
    }

    fn failing(name: &'static str, after: Duration) -> ProcessRef {
        ProcessFn::arc(
            name,
            move || async move {
                tokio::time::sleep(after).await;
                Err(BindFailed.into())
            },
            |_ctx: Context| async { Ok(()) },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_ok_start_is_not_terminal() {
        let entries = vec![
            entry(0, sleeper("quick", Duration::ZERO)),
            entry(1, failing("slow", Duration::from_millis(250))),
        ];

        let err = wait_started(&entries, &Context::new(), &Bus::new(8))
            .await
            .unwrap();
        assert_eq!(err.process(), Some("slow"));
        assert!(matches!(err, ProcessError::Start { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_wait_for_others() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let long: ProcessRef = ProcessFn::arc(
            "long",
            move || {
                let flag = Arc::clone(&flag);
                async move {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            },
            |_ctx: Context| async { Ok(()) },
        );
        let entries = vec![entry(0, failing("api", Duration::ZERO)), entry(1, long)];

        let err = wait_started(&entries, &Context::new(), &Bus::new(8)).await;
        assert_eq!(err.unwrap().process(), Some("api"));
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_cancel_is_not_an_error() {
        let entries = vec![entry(0, sleeper("server", Duration::from_secs(3600)))];
        let ctx = Context::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            canceller.cancel();
        });

        assert!(wait_started(&entries, &ctx, &Bus::new(8)).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_deadline_is_reported() {
        let entries = vec![entry(0, sleeper("server", Duration::from_secs(3600)))];
        let ctx = Context::with_timeout(&Context::new(), Duration::from_millis(50));

        let err = wait_started(&entries, &ctx, &Bus::new(8)).await.unwrap();
        assert!(matches!(
            err,
            ProcessError::Context(ContextError::DeadlineExceeded)
        ));
    }

    #[tokio::test]
    async fn test_all_ok_ends_phase() {
        let entries = vec![
            entry(0, sleeper("a", Duration::ZERO)),
            entry(1, sleeper("b", Duration::ZERO)),
        ];
        assert!(wait_started(&entries, &Context::new(), &Bus::new(8)).await.is_none());
        assert!(wait_started(&[], &Context::new(), &Bus::new(8)).await.is_none());
    }

    #[tokio::test]
    async fn test_panic_is_attributed() {
        let p: ProcessRef = ProcessFn::arc(
            "crashy",
            || async {
                let fail = true;
                if fail {
                    panic!("listener exploded");
                }
                Ok(())
            },
            |_ctx: Context| async { Ok(()) },
        );

        let err = wait_started(&[entry(0, p)], &Context::new(), &Bus::new(8))
            .await
            .unwrap();
        match err {
            ProcessError::Panicked {
                name,
                operation,
                reason,
            } => {
                assert_eq!(&*name, "crashy");
                assert_eq!(operation, Operation::Start);
                assert_eq!(reason, "listener exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
