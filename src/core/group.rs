//! # Group: concurrent startup and graceful shutdown of registered processes.
//!
//! The [`Group`] owns the process [`Registry`], the event bus and the
//! configured subscribers. A single call to [`Group::wait`] drives the whole
//! lifecycle on a spawned task, so dropping the `wait` future never skips
//! the shutdown phase.
//!
//! ## High-level architecture
//! ```text
//! add(start, shutdown) ×N  ──►  Registry (mutex, append-only, Idle only)
//!
//! wait(ctx):
//!   Registry::begin()                      Idle → Running
//!   ├─► runner::wait_started(entries, ctx)
//!   │     └─ ends on first start failure, or ctx done, or every start Ok
//!   │                                      Running → Terminating
//!   ├─► shutdown::shutdown_all(entries, cfg.shutdown_deadline())
//!   │     └─ ends when every shutdown operation returned
//!   └─► GroupError::from_parts(shutdown errors, run error)
//!                                          Terminating → Done
//!
//! Event flow:
//!   runner / shutdown / Group ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use gracevisor::{Config, Context, Group};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let group = Group::new(Config::default().with_shutdown_timeout(Duration::from_secs(1)));
//!
//!     let stop = CancellationToken::new();
//!     let serve = stop.clone();
//!     group.add(
//!         move || {
//!             let serve = serve.clone();
//!             async move {
//!                 serve.cancelled().await;
//!                 Ok(())
//!             }
//!         },
//!         move |_ctx: Context| {
//!             let stop = stop.clone();
//!             async move {
//!                 stop.cancel();
//!                 Ok(())
//!             }
//!         },
//!     );
//!
//!     let ctx = Context::new();
//!     ctx.cancel();
//!     assert!(group.wait(&ctx).await.is_ok());
//! }
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::context::Context;
use crate::core::builder::GroupBuilder;
use crate::core::registry::{Entry, Phase, Registry};
use crate::core::{runner, shutdown};
use crate::error::{BoxError, GroupError, ProcessError};
use crate::events::{Bus, Event, EventKind};
use crate::processes::{ProcessFn, ProcessRef};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Runs a fixed set of processes and shuts them all down together.
///
/// Registration (`add*`) is thread-safe and allowed only before [`Group::wait`].
/// A group is single-use.
pub struct Group {
    shared: Arc<Shared>,
}

/// State shared with the task that drives a run.
struct Shared {
    cfg: Config,
    bus: Bus,
    registry: Registry,
    subscribers: Mutex<Vec<Arc<dyn Subscribe>>>,
}

impl Group {
    /// Creates a group without subscribers.
    pub fn new(cfg: Config) -> Self {
        GroupBuilder::new(cfg).build()
    }

    /// Returns a builder for a group with subscribers.
    pub fn builder(cfg: Config) -> GroupBuilder {
        GroupBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            shared: Arc::new(Shared {
                cfg,
                bus,
                registry: Registry::new(),
                subscribers: Mutex::new(subscribers),
            }),
        }
    }

    /// Registers a start operation and its shutdown operation.
    ///
    /// The process is named `process-<index>` after its registration position.
    /// Nothing runs until [`Group::wait`].
    pub fn add<S, SF, D, DF>(&self, start: S, shutdown: D)
    where
        S: Fn() -> SF + Send + Sync + 'static,
        SF: Future<Output = Result<(), BoxError>> + Send + 'static,
        D: Fn(Context) -> DF + Send + Sync + 'static,
        DF: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.register(None, move |index| -> ProcessRef {
            ProcessFn::arc(format!("process-{index}"), start, shutdown)
        });
    }

    /// Registers a named start/shutdown pair.
    pub fn add_named<S, SF, D, DF>(&self, name: impl Into<Cow<'static, str>>, start: S, shutdown: D)
    where
        S: Fn() -> SF + Send + Sync + 'static,
        SF: Future<Output = Result<(), BoxError>> + Send + 'static,
        D: Fn(Context) -> DF + Send + Sync + 'static,
        DF: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let name = name.into();
        let label = name.to_string();
        self.register(Some(&label), move |_| -> ProcessRef {
            ProcessFn::arc(name, start, shutdown)
        });
    }

    /// Registers a [`Process`](crate::Process) implementation.
    pub fn add_process(&self, process: ProcessRef) {
        let label = process.name().to_string();
        self.register(Some(&label), move |_| process);
    }

    /// `label` is the process name when known before registration; `None` for [`Group::add`].
    fn register<F>(&self, label: Option<&str>, make: F)
    where
        F: FnOnce(usize) -> ProcessRef,
    {
        let phase = match self.shared.registry.push_with(make) {
            Ok(name) => {
                debug!(process = %name, "process registered");
                return;
            }
            Err(phase) => phase,
        };

        let mut ev = Event::new(EventKind::ProcessRejected);
        match label {
            Some(name) => {
                warn!(process = name, phase = ?phase, "registration after wait() began; dropped");
                ev = ev
                    .with_process(name)
                    .with_reason("registered after wait() began");
            }
            None => {
                warn!(phase = ?phase, "unnamed registration after wait() began; dropped");
                ev = ev.with_reason("unnamed process registered after wait() began");
            }
        }
        self.shared.bus.publish(ev);
    }

    /// Number of registered processes not yet started.
    pub fn len(&self) -> usize {
        self.shared.registry.len()
    }

    /// True if no process is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of registered processes, in registration order.
    pub fn names(&self) -> Vec<Arc<str>> {
        self.shared.registry.names()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.shared.registry.phase()
    }

    /// Group configuration.
    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }

    /// Runs every process, then shuts every process down.
    ///
    /// 1. Launches all start operations concurrently.
    /// 2. Waits until one fails, or `ctx` ends, or all of them returned `Ok`.
    /// 3. Launches all shutdown operations concurrently with a fresh context
    ///    that expires after [`Config::shutdown_timeout`], and waits for all of them.
    ///
    /// Returns `Ok(())` only if no start operation failed, `ctx` ended with
    /// plain cancellation (or not at all) and every shutdown operation succeeded.
    /// Otherwise the [`GroupError`] lists every cause: shutdown errors in
    /// registration order, then the run-phase error.
    ///
    /// A second call returns [`ProcessError::AlreadyStarted`] without running anything.
    ///
    /// # Cancel safety
    /// The run is driven by a spawned task. Dropping the returned future (for
    /// example through `tokio::time::timeout`) acts like a plain cancellation
    /// of `ctx`: start operations keep running, every shutdown operation is
    /// still invoked once, and the group still reaches [`Phase::Done`]. Only
    /// the result is lost.
    pub async fn wait(&self, ctx: &Context) -> Result<(), GroupError> {
        let Some(entries) = self.shared.registry.begin() else {
            warn!("wait() called on a group that already ran");
            return Err(GroupError::single(ProcessError::AlreadyStarted));
        };

        let run_ctx = Context::with_cancel(ctx);
        let abandon = run_ctx.cancel_on_drop();
        let driver = tokio::spawn(Arc::clone(&self.shared).drive(entries, run_ctx));
        let joined = driver.await;
        abandon.disarm();

        match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                warn!(error = %err, "group run aborted");
                Err(GroupError::single(ProcessError::Aborted))
            }
        }
    }
}

impl Shared {
    /// Run phase, shutdown phase and event flush for one `wait`.
    async fn drive(self: Arc<Self>, entries: Vec<Entry>, ctx: Context) -> Result<(), GroupError> {
        let delivery = self.start_delivery();

        self.bus
            .publish(Event::new(EventKind::RunStarted).with_count(entries.len()));
        debug!(processes = entries.len(), "run started");

        let run_err = runner::wait_started(&entries, &ctx, &self.bus).await;

        self.registry.advance(Phase::Terminating);
        let shutdown_errs =
            shutdown::shutdown_all(&entries, self.cfg.shutdown_deadline(), &self.bus).await;

        let result = GroupError::from_parts(shutdown_errs, run_err);
        let errors = result.as_ref().map_or(0, GroupError::len);
        self.bus
            .publish(Event::new(EventKind::AllStopped).with_count(errors));
        debug!(errors, "all stopped");

        if let Some(delivery) = delivery {
            delivery.finish().await;
        }
        self.registry.advance(Phase::Done);

        match result {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Spawns the bus listener feeding the subscriber set, if there are subscribers.
    fn start_delivery(&self) -> Option<Delivery> {
        let subs = std::mem::take(&mut *self.subscribers.lock());
        if subs.is_empty() {
            return None;
        }

        let set = SubscriberSet::new(subs, self.bus.clone());
        let mut rx = self.bus.subscribe();
        let stop = CancellationToken::new();
        let stopped = stop.clone();

        let listener = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "event listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = stopped.cancelled() => break,
                }
            }
            set.shutdown().await;
        });

        Some(Delivery { stop, listener })
    }
}

/// Handle to the running bus listener.
struct Delivery {
    stop: CancellationToken,
    listener: JoinHandle<()>,
}

impl Delivery {
    /// Stops the listener once the bus is drained and waits for subscribers to finish.
    async fn finish(self) {
        self.stop.cancel();
        if let Err(err) = self.listener.await {
            warn!(error = %err, "event listener failed");
        }
    }
}
