//! # Basic Example
//!
//! Three processes share one group:
//! - `ticker` fails after a few ticks, which starts the shutdown;
//! - `cache` flushes slowly but honours its shutdown deadline;
//! - `audit` shuts down cleanly.
//!
//! A custom subscriber counts lifecycle events next to the built-in `LogWriter`.
//!
//! ## Run
//! ```bash
//! cargo run --example basic --features logging
//! ```

use std::{
    sync::Arc,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use gracevisor::{Config, Context, Event, EventKind, Group, LogWriter, Subscribe};

#[derive(Default)]
struct Counters {
    started: AtomicU64,
    failed: AtomicU64,
    stopped: AtomicU64,
}

impl Counters {
    fn print(&self) {
        println!();
        println!("Lifecycle:");
        println!(" ├─► Started:         {}", self.started.load(Ordering::Relaxed));
        println!(" ├─► Failed:          {}", self.failed.load(Ordering::Relaxed));
        println!(" └─► Stopped cleanly: {}", self.stopped.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Subscribe for Counters {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::ProcessStarting => {
                self.started.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::ProcessFailed | EventKind::ShutdownFailed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::ShutdownFinished => {
                self.stopped.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "counters"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let counters = Arc::new(Counters::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), counters.clone()];

    let cfg = Config::default().with_shutdown_timeout(Duration::from_millis(300));
    let group = Group::builder(cfg).with_subscribers(subs).build();

    group.add_named(
        "ticker",
        || async {
            for tick in 1..=3 {
                tokio::time::sleep(Duration::from_millis(100)).await;
                println!("tick {tick}");
            }
            Err("ticker lost its clock".into())
        },
        |_ctx: Context| async { Ok(()) },
    );

    group.add_named(
        "cache",
        || async {
            std::future::pending::<()>().await;
            Ok(())
        },
        |ctx: Context| async move {
            // Flushing takes longer than the deadline allows.
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(2)) => Ok(()),
                cause = ctx.done() => Err(cause.into()),
            }
        },
    );

    group.add_named(
        "audit",
        || async {
            std::future::pending::<()>().await;
            Ok(())
        },
        |_ctx: Context| async { Ok(()) },
    );

    let ctx = Context::with_shutdown_signal(&Context::new());
    match group.wait(&ctx).await {
        Ok(()) => println!("stopped cleanly"),
        Err(err) => {
            println!("stopped with {} error(s):", err.len());
            for e in &err {
                println!("  [{}] {e}", e.as_label());
            }
        }
    }

    counters.print();
    Ok(())
}
