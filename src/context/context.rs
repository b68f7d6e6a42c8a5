//! # Cancellation-bearing context.
//!
//! [`Context`] wraps a [`CancellationToken`] with two extra pieces of state:
//! an optional **deadline** and the **cause** that ended it.
//!
//! ## Rules
//! - The first cause wins: once a context is done its [`Context::err`] never changes.
//! - Children inherit cancellation from their parent (via `child_token`) and
//!   report the parent's cause when the parent ended first.
//! - A child's deadline is never later than its parent's.
//! - Deadline expiry is recorded as [`ContextError::DeadlineExceeded`].
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use gracevisor::{Context, ContextError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let root = Context::new();
//! let ctx = Context::with_timeout(&root, Duration::from_millis(5));
//!
//! let cause = ctx.done().await;
//! assert_eq!(cause, ContextError::DeadlineExceeded);
//! assert!(root.err().is_none());
//! # }
//! ```

use std::error::Error;
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::ContextError;

struct Inner {
    token: CancellationToken,
    deadline: Option<Instant>,
    cause: OnceLock<ContextError>,
    parent: Option<Context>,
    /// Stops the deadline timer once the last clone is dropped.
    _timer: Option<DropGuard>,
}

impl Inner {
    /// Records `cause` and cancels the token, unless the context already ended.
    fn finish(&self, cause: ContextError) {
        if self.token.is_cancelled() {
            return;
        }
        let _ = self.cause.set(cause);
        self.token.cancel();
    }
}

/// Cheaply cloneable cancellation context with an optional deadline and cause.
///
/// Clones share state: cancelling one clone cancels all of them.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Creates a root context: no parent, no deadline, not cancelled.
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Wraps an existing token.
    ///
    /// Cancelling `token` from outside ends the context with [`ContextError::Canceled`].
    pub fn from_token(token: CancellationToken) -> Self {
        Self::build(token, None, None)
    }

    /// Derives a child that can be cancelled independently of `parent`.
    pub fn with_cancel(parent: &Context) -> Self {
        Self::build(
            parent.inner.token.child_token(),
            parent.inner.deadline,
            Some(parent.clone()),
        )
    }

    /// Derives a child that ends at `at` (or earlier, if the parent ends first).
    pub fn with_deadline(parent: &Context, at: Instant) -> Self {
        let deadline = match parent.inner.deadline {
            Some(inherited) => inherited.min(at),
            None => at,
        };
        Self::build(
            parent.inner.token.child_token(),
            Some(deadline),
            Some(parent.clone()),
        )
    }

    /// Derives a child that ends `timeout` from now.
    pub fn with_timeout(parent: &Context, timeout: Duration) -> Self {
        Self::with_deadline(parent, Instant::now() + timeout)
    }

    fn build(token: CancellationToken, deadline: Option<Instant>, parent: Option<Context>) -> Self {
        let timer = deadline.and_then(|at| {
            let handle = tokio::runtime::Handle::try_current().ok()?;
            Some((handle, at, CancellationToken::new()))
        });
        let ctx = Self {
            inner: Arc::new(Inner {
                token,
                deadline,
                cause: OnceLock::new(),
                parent,
                _timer: timer.as_ref().map(|(_, _, release)| release.clone().drop_guard()),
            }),
        };
        if let Some((handle, at, release)) = timer {
            ctx.arm_timer(&handle, at, release);
        }
        ctx
    }

    /// Cancels the token when the deadline passes, so that plain token
    /// holders (see [`Context::token`]) observe expiry too.
    ///
    /// The timer only holds a weak reference: it ends when the context is
    /// done or when its last clone is dropped. Outside a runtime no timer is
    /// armed; expiry is then detected lazily by [`Context::err`] and
    /// [`Context::done`].
    fn arm_timer(&self, handle: &tokio::runtime::Handle, at: Instant, release: CancellationToken) {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let token = self.inner.token.clone();
        handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = release.cancelled() => {}
                _ = time::sleep_until(at) => {
                    if let Some(inner) = inner.upgrade() {
                        inner.finish(ContextError::DeadlineExceeded);
                    }
                }
            }
        });
    }

    /// Ends the context with [`ContextError::Canceled`].
    pub fn cancel(&self) {
        self.inner.finish(ContextError::Canceled);
    }

    /// Ends the context with a custom cause.
    ///
    /// A group waiting on this context reports `cause` as its run-phase error.
    pub fn cancel_with_cause<E>(&self, cause: E)
    where
        E: Error + Send + Sync + 'static,
    {
        self.inner.finish(ContextError::Cause(Arc::new(cause)));
    }

    /// Returns the cause once the context is done, `None` while it is live.
    pub fn err(&self) -> Option<ContextError> {
        if let Some(cause) = self.inner.cause.get() {
            return Some(cause.clone());
        }
        if self.inner.token.is_cancelled() {
            let inherited = self.inner.parent.as_ref().and_then(Context::err);
            return Some(inherited.unwrap_or(ContextError::Canceled));
        }
        if self.is_expired() {
            self.inner.finish(ContextError::DeadlineExceeded);
            return self.err();
        }
        None
    }

    /// Returns `true` once the context has been cancelled or its deadline passed.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Completes when the context is done and returns its cause.
    pub async fn done(&self) -> ContextError {
        match self.inner.deadline {
            Some(at) => {
                tokio::select! {
                    _ = self.inner.token.cancelled() => {}
                    _ = time::sleep_until(at) => self.inner.finish(ContextError::DeadlineExceeded),
                }
            }
            None => self.inner.token.cancelled().await,
        }
        self.err().unwrap_or(ContextError::Canceled)
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Returns the time left before the deadline (`None` = unbounded).
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Returns a child token that is cancelled whenever this context ends.
    ///
    /// Useful to hand the context to APIs that only understand tokens.
    pub fn token(&self) -> CancellationToken {
        self.inner.token.child_token()
    }

    /// Cancels this context with plain [`ContextError::Canceled`] when the
    /// returned guard is dropped, unless it is disarmed first.
    pub(crate) fn cancel_on_drop(&self) -> DropGuard {
        self.inner.token.clone().drop_guard()
    }

    fn is_expired(&self) -> bool {
        self.inner
            .deadline
            .is_some_and(|at| Instant::now() >= at)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .finish()
    }
}
