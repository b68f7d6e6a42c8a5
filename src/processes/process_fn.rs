//! # Closure-backed process (`ProcessFn`)
//!
//! [`ProcessFn`] pairs two closures: `S: Fn() -> Fut` for the start operation
//! and `D: Fn(Context) -> Fut` for the shutdown operation. Each call produces
//! a fresh future; shared state between the two is expressed explicitly with
//! `Arc<...>` captured by both closures.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use gracevisor::{Context, ProcessFn, ProcessRef};
//! use tokio_util::sync::CancellationToken;
//!
//! let stop = CancellationToken::new();
//! let p: ProcessRef = ProcessFn::arc(
//!     "worker",
//!     {
//!         let stop = stop.clone();
//!         move || {
//!             let stop = stop.clone();
//!             async move {
//!                 stop.cancelled().await;
//!                 Ok(())
//!             }
//!         }
//!     },
//!     move |_ctx: Context| {
//!         let stop = stop.clone();
//!         async move {
//!             stop.cancel();
//!             Ok(())
//!         }
//!     },
//! );
//!
//! assert_eq!(p.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::BoxError;
use crate::processes::process::Process;

/// Closure-backed process implementation.
pub struct ProcessFn<S, D> {
    name: Cow<'static, str>,
    start: S,
    shutdown: D,
}

impl<S, SF, D, DF> ProcessFn<S, D>
where
    S: Fn() -> SF + Send + Sync + 'static,
    SF: Future<Output = Result<(), BoxError>> + Send + 'static,
    D: Fn(Context) -> DF + Send + Sync + 'static,
    DF: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    /// Creates a new closure-backed process.
    ///
    /// Prefer [`ProcessFn::arc`] when you immediately need a [`ProcessRef`](crate::ProcessRef).
    pub fn new(name: impl Into<Cow<'static, str>>, start: S, shutdown: D) -> Self {
        Self {
            name: name.into(),
            start,
            shutdown,
        }
    }

    /// Creates the process and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, start: S, shutdown: D) -> Arc<Self> {
        Arc::new(Self::new(name, start, shutdown))
    }
}

impl<S, D> std::fmt::Debug for ProcessFn<S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessFn").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<S, SF, D, DF> Process for ProcessFn<S, D>
where
    S: Fn() -> SF + Send + Sync + 'static,
    SF: Future<Output = Result<(), BoxError>> + Send + 'static,
    D: Fn(Context) -> DF + Send + Sync + 'static,
    DF: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), BoxError> {
        (self.start)().await
    }

    async fn shutdown(&self, ctx: Context) -> Result<(), BoxError> {
        (self.shutdown)(ctx).await
    }
}
