//! # OS termination signals as a context.
//!
//! [`Context::with_shutdown_signal`] derives a context that is cancelled with
//! plain [`ContextError::Canceled`](crate::ContextError::Canceled) when the
//! process receives a termination signal, so a group waiting on it shuts
//! down without reporting an error.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use tracing::{debug, warn};

use super::Context;

impl Context {
    /// Derives a child of `parent` that is cancelled on the first termination signal.
    ///
    /// Must be called from within a tokio runtime. If signal registration
    /// fails a warning is logged and the child only ends with its parent.
    pub fn with_shutdown_signal(parent: &Context) -> Context {
        let ctx = Context::with_cancel(parent);
        let watcher = ctx.clone();
        tokio::spawn(async move {
            tokio::select! {
                res = wait_for_shutdown_signal() => match res {
                    Ok(()) => {
                        debug!("termination signal received");
                        watcher.cancel();
                    }
                    Err(err) => warn!(error = %err, "failed to register signal handlers"),
                },
                _ = watcher.done() => {}
            }
        });
        ctx
    }
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::error::ContextError;

    #[tokio::test]
    async fn test_sigterm_cancels_plainly() {
        let parent = Context::new();
        let ctx = Context::with_shutdown_signal(&parent);
        // Let the watcher install its handlers before the signal is sent.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        let status = std::process::Command::new("kill")
            .arg("-TERM")
            .arg(std::process::id().to_string())
            .status()
            .unwrap();
        assert!(status.success());

        let cause = tokio::time::timeout(Duration::from_secs(5), ctx.done())
            .await
            .unwrap();
        assert_eq!(cause, ContextError::Canceled);
        assert!(parent.err().is_none());
    }
}
