//! # gracevisor
//!
//! **Gracevisor** runs a fixed group of long-running async processes and
//! shuts all of them down together, under one deadline, as soon as the first
//! one fails or the caller asks it to stop.
//!
//! Each process is a pair of operations: a *start* operation (for example
//! "serve until stopped") and a *shutdown* operation that receives a
//! [`Context`] carrying the shutdown deadline. The crate is designed as the
//! outermost layer of a service binary: the place where servers, consumers
//! and background workers are wired together.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  start/stop  │   │  start/stop  │   │  start/stop  │
//!     │ (process #1) │   │ (process #2) │   │ (process #3) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Group                                                            │
//! │  - Registry (ordered processes + lifecycle phase)                 │
//! │  - Bus (broadcast events)                                         │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬────────────────────────────────────────────────────┬───────┘
//!        ▼                                                    │
//!   run phase: every start() on its own task                  │
//!        │  first Err / panic, or ctx done, or all Ok         │
//!        ▼                                                    │
//!   shutdown phase: every shutdown(ctx) on its own task       │
//!        │  shared deadline = Config::shutdown_timeout        │
//!        ▼                                                    ▼
//!   Result<(), GroupError>                         Bus ──► listener ──► subscribers
//! ```
//!
//! ### Lifecycle
//! ```text
//! Idle ──wait(ctx)──► Running ──► Terminating ──► Done
//!
//! Running:
//!   ├─ start() → Err / panic  ─► run error = that failure
//!   ├─ ctx canceled (plain)    ─► no run error
//!   ├─ ctx deadline / cause    ─► run error = ctx cause
//!   └─ every start() → Ok      ─► run error = ctx cause, if any
//!
//! Terminating:
//!   └─ every shutdown(ctx') awaited, ctx' expires after shutdown_timeout
//!
//! Done:
//!   └─ GroupError = shutdown errors (registration order) + run error
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                          |
//! |-------------------|------------------------------------------------------------------|---------------------------------------------|
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom subscribers).| [`Subscribe`]                              |
//! | **Orchestration** | Start a group of processes and shut them down together.          | [`Group`], [`GroupBuilder`], [`Phase`]      |
//! | **Contexts**      | Cancellation with causes, deadlines and OS signal wiring.        | [`Context`], [`ContextError`]               |
//! | **Errors**        | Typed per-process errors and their aggregate.                    | [`ProcessError`], [`GroupError`]            |
//! | **Processes**     | Define processes as closures or trait objects.                   | [`Process`], [`ProcessFn`], [`ProcessRef`]  |
//! | **Configuration** | Shutdown deadline and event bus settings.                        | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use gracevisor::{Config, Context, Group};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let group = Group::new(Config::default().with_shutdown_timeout(Duration::from_millis(100)));
//!
//!     group.add_named(
//!         "ticker",
//!         || async {
//!             tokio::time::sleep(Duration::from_millis(10)).await;
//!             Err("ticker lost its clock".into())
//!         },
//!         |_ctx: Context| async { Ok(()) },
//!     );
//!
//!     let err = group.wait(&Context::new()).await.unwrap_err();
//!     assert_eq!(err.len(), 1);
//!     assert_eq!(err.errors()[0].process(), Some("ticker"));
//! }
//! ```
mod config;
mod context;
mod core;
mod error;
mod events;
mod processes;
mod subscribers;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_SHUTDOWN_TIMEOUT};
pub use context::Context;
pub use core::{Group, GroupBuilder, Phase};
pub use error::{BoxError, ContextError, GroupError, Operation, ProcessError};
pub use events::{Event, EventKind};
pub use processes::{Process, ProcessFn, ProcessRef};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
