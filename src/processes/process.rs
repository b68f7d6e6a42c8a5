//! # Process abstraction.
//!
//! A [`Process`] is one long-running unit of work registered in a
//! [`Group`](crate::Group): a `start` operation that runs until the work ends,
//! and a `shutdown` operation that makes it end.
//!
//! Both operations are invoked exactly once per group run, each on its own
//! tokio task. `shutdown` may run while `start` is still executing.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::BoxError;

/// Shared handle to a process.
pub type ProcessRef = Arc<dyn Process>;

/// # Long-running unit of work with a graceful stop.
///
/// # Contract
/// - `start` returning `Err` asks the group to shut down; a single `Ok` does not.
/// - `shutdown` must observe [`Context::done`] and return promptly once it
///   fires, typically with the context's error. The group never aborts a
///   shutdown operation; one that ignores its context delays `wait` forever.
/// - `shutdown` must be safe to run concurrently with an unfinished `start`.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use gracevisor::{BoxError, Context, Process};
/// use tokio_util::sync::CancellationToken;
///
/// struct Ticker {
///     stop: CancellationToken,
/// }
///
/// #[async_trait]
/// impl Process for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     async fn start(&self) -> Result<(), BoxError> {
///         self.stop.cancelled().await;
///         Ok(())
///     }
///
///     async fn shutdown(&self, _ctx: Context) -> Result<(), BoxError> {
///         self.stop.cancel();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Process: Send + Sync + 'static {
    /// Returns a stable, human-readable process name.
    fn name(&self) -> &str;

    /// Runs the process until it ends on its own or fails.
    async fn start(&self) -> Result<(), BoxError>;

    /// Stops the process, honoring the deadline carried by `ctx`.
    async fn shutdown(&self, ctx: Context) -> Result<(), BoxError>;
}
