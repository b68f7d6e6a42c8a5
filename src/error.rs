//! Error types used by the gracevisor runtime and processes.
//!
//! This module defines:
//!
//! - [`ContextError`]: why a [`Context`](crate::Context) ended.
//! - [`ProcessError`]: one failure observed while running a group.
//! - [`GroupError`]: the aggregate returned by [`Group::wait`](crate::Group::wait).
//!
//! Operations report failures as [`BoxError`]; the original value stays
//! reachable through [`GroupError::find`] and [`GroupError::contains`].

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Error type accepted from start and shutdown operations.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// # Reason a context ended.
///
/// Equality is identity for [`ContextError::Cause`]: two causes are equal only
/// when they share the same allocation.
#[derive(Error, Debug, Clone)]
pub enum ContextError {
    /// Plain, voluntary cancellation.
    #[error("context canceled")]
    Canceled,

    /// The context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// Cancelled with a caller-supplied cause.
    #[error("{0}")]
    Cause(Arc<dyn Error + Send + Sync + 'static>),
}

impl ContextError {
    /// Returns `true` for plain cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, ContextError::Canceled)
    }

    /// Returns `true` for deadline expiry.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, ContextError::DeadlineExceeded)
    }
}

impl PartialEq for ContextError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ContextError::Canceled, ContextError::Canceled) => true,
            (ContextError::DeadlineExceeded, ContextError::DeadlineExceeded) => true,
            (ContextError::Cause(a), ContextError::Cause(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Which operation of a process produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    Shutdown,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Start => f.write_str("start"),
            Operation::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// # A single failure observed by a group.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProcessError {
    /// A start operation returned an error; this triggered shutdown.
    #[error("process {name:?} failed: {source}")]
    Start {
        /// Process name.
        name: Arc<str>,
        /// Error returned by the operation.
        source: BoxError,
    },

    /// The context passed to `wait` ended with something other than plain cancellation.
    #[error("run context ended: {0}")]
    Context(#[source] ContextError),

    /// A shutdown operation returned an error (deadline expiry included).
    #[error("process {name:?} shutdown failed: {source}")]
    Shutdown {
        /// Process name.
        name: Arc<str>,
        /// Error returned by the operation.
        source: BoxError,
    },

    /// An operation panicked.
    #[error("process {name:?} panicked during {operation}: {reason}")]
    Panicked {
        /// Process name.
        name: Arc<str>,
        /// Operation that panicked.
        operation: Operation,
        /// Panic payload rendered as text.
        reason: String,
    },

    /// `wait` was called on a group that already ran.
    #[error("group already started")]
    AlreadyStarted,

    /// The task driving the group was cancelled by runtime shutdown before
    /// every shutdown operation returned.
    #[error("group run aborted by runtime shutdown")]
    Aborted,
}

impl ProcessError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use gracevisor::ProcessError;
    ///
    /// assert_eq!(ProcessError::AlreadyStarted.as_label(), "group_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcessError::Start { .. } => "process_start_failed",
            ProcessError::Context(_) => "run_context_ended",
            ProcessError::Shutdown { .. } => "process_shutdown_failed",
            ProcessError::Panicked { .. } => "process_panicked",
            ProcessError::AlreadyStarted => "group_already_started",
            ProcessError::Aborted => "group_run_aborted",
        }
    }

    /// Returns the process name, if the error belongs to one process.
    pub fn process(&self) -> Option<&str> {
        match self {
            ProcessError::Start { name, .. }
            | ProcessError::Shutdown { name, .. }
            | ProcessError::Panicked { name, .. } => Some(&**name),
            ProcessError::Context(_) | ProcessError::AlreadyStarted | ProcessError::Aborted => {
                None
            }
        }
    }

    /// Iterates over this error and every cause below it.
    ///
    /// Custom context causes are unwrapped so the caller's own error is reachable.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn Error + 'static)> {
        let mut next: Option<&(dyn Error + 'static)> = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            next = match current.downcast_ref::<ContextError>() {
                Some(ContextError::Cause(inner)) => Some(inner.as_ref() as &(dyn Error + 'static)),
                _ => current.source(),
            };
            Some(current)
        })
    }
}

/// # Aggregate outcome of a failed group run.
///
/// Holds every [`ProcessError`] observed, shutdown-phase errors first (in
/// registration order) followed by the run-phase error. `Display` renders one
/// error per line.
#[derive(Debug)]
pub struct GroupError {
    errors: Vec<ProcessError>,
}

impl GroupError {
    /// Combines shutdown-phase errors with the run-phase error.
    ///
    /// Returns `None` when there is nothing to report.
    pub fn from_parts(shutdown: Vec<ProcessError>, run: Option<ProcessError>) -> Option<Self> {
        let mut errors = shutdown;
        errors.extend(run);
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub(crate) fn single(err: ProcessError) -> Self {
        Self { errors: vec![err] }
    }

    /// All collected errors.
    pub fn errors(&self) -> &[ProcessError] {
        &self.errors
    }

    /// Iterates over the collected errors.
    pub fn iter(&self) -> std::slice::Iter<'_, ProcessError> {
        self.errors.iter()
    }

    /// Number of collected errors (never zero).
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always `false`; present for API symmetry with [`GroupError::len`].
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consumes the aggregate and returns the collected errors.
    pub fn into_errors(self) -> Vec<ProcessError> {
        self.errors
    }

    /// Returns the first cause of type `E`, searching every error's chain.
    pub fn find<E: Error + 'static>(&self) -> Option<&E> {
        self.errors
            .iter()
            .find_map(|err| err.chain().find_map(|cause| cause.downcast_ref::<E>()))
    }

    /// Returns `true` if any cause equals `target`.
    ///
    /// # Example
    /// ```
    /// use gracevisor::{ContextError, GroupError, ProcessError};
    ///
    /// let err = GroupError::from_parts(
    ///     vec![ProcessError::Shutdown {
    ///         name: "api".into(),
    ///         source: ContextError::DeadlineExceeded.into(),
    ///     }],
    ///     None,
    /// )
    /// .unwrap();
    /// assert!(err.contains(&ContextError::DeadlineExceeded));
    /// ```
    pub fn contains<E: Error + PartialEq + 'static>(&self, target: &E) -> bool {
        self.errors.iter().any(|err| {
            err.chain()
                .any(|cause| cause.downcast_ref::<E>() == Some(target))
        })
    }

    /// Returns `true` if any shutdown operation reported deadline expiry.
    pub fn is_deadline_exceeded(&self) -> bool {
        self.contains(&ContextError::DeadlineExceeded)
    }
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl Error for GroupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.errors.first().map(|err| err as &(dyn Error + 'static))
    }
}

impl<'a> IntoIterator for &'a GroupError {
    type Item = &'a ProcessError;
    type IntoIter = std::slice::Iter<'a, ProcessError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("bind failed")]
    struct BindFailed;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("flush failed")]
    struct FlushFailed;

    fn start_err() -> ProcessError {
        ProcessError::Start {
            name: "api".into(),
            source: BindFailed.into(),
        }
    }

    fn shutdown_err() -> ProcessError {
        ProcessError::Shutdown {
            name: "sink".into(),
            source: FlushFailed.into(),
        }
    }

    #[test]
    fn test_empty_parts_is_success() {
        assert!(GroupError::from_parts(Vec::new(), None).is_none());
    }

    #[test]
    fn test_shutdown_errors_come_first() {
        let err = GroupError::from_parts(vec![shutdown_err()], Some(start_err())).unwrap();
        assert_eq!(err.len(), 2);
        assert_eq!(err.errors()[0].as_label(), "process_shutdown_failed");
        assert_eq!(err.errors()[1].as_label(), "process_start_failed");
        assert_eq!(
            err.to_string(),
            "process \"sink\" shutdown failed: flush failed\nprocess \"api\" failed: bind failed"
        );
    }

    #[test]
    fn test_contains_walks_sources() {
        let err = GroupError::from_parts(vec![shutdown_err()], Some(start_err())).unwrap();
        assert!(err.contains(&BindFailed));
        assert!(err.contains(&FlushFailed));
        assert!(err.find::<BindFailed>().is_some());
        assert!(!err.is_deadline_exceeded());
    }

    #[test]
    fn test_context_cause_is_unwrapped() {
        let cause = ContextError::Cause(Arc::new(BindFailed));
        let err = GroupError::from_parts(Vec::new(), Some(ProcessError::Context(cause))).unwrap();
        assert!(err.contains(&BindFailed));
        assert!(err.find::<ContextError>().is_some());
    }

    #[test]
    fn test_deadline_from_shutdown() {
        let err = GroupError::from_parts(
            vec![ProcessError::Shutdown {
                name: "api".into(),
                source: ContextError::DeadlineExceeded.into(),
            }],
            None,
        )
        .unwrap();
        assert!(err.is_deadline_exceeded());
        assert_eq!(err.errors()[0].process(), Some("api"));
    }

    #[test]
    fn test_cause_equality_is_identity() {
        let a = ContextError::Cause(Arc::new(BindFailed));
        let b = ContextError::Cause(Arc::new(BindFailed));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(ContextError::Canceled, ContextError::DeadlineExceeded);
    }
}
