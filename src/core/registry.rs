//! # Process registry - ordered, append-only list of processes.
//!
//! The registry is the only shared mutable state of a group. It holds the
//! registered processes and the group's [`Phase`], both behind one mutex so
//! that a registration can never race with `wait` taking the list.
//!
//! ## Rules
//! - Entries keep registration order; that order is the order of errors in the
//!   final aggregate.
//! - Registration is accepted only while the group is [`Phase::Idle`].
//! - [`Registry::begin`] moves `Idle → Running` and hands out the entries exactly once.
//! - No removal.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::processes::ProcessRef;

/// Lifecycle of a group run.
///
/// ```text
/// Idle ──wait()──► Running ──first failure / context done──► Terminating ──all shutdowns returned──► Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting registrations; `wait` not called yet.
    Idle,
    /// Start operations launched; waiting for the first terminal condition.
    Running,
    /// Shutdown operations launched; waiting for all of them.
    Terminating,
    /// `wait` returned.
    Done,
}

/// One registered process.
#[derive(Clone)]
pub(crate) struct Entry {
    /// Registration position (0-based).
    pub(crate) index: usize,
    pub(crate) name: Arc<str>,
    pub(crate) process: ProcessRef,
}

struct State {
    phase: Phase,
    entries: Vec<Entry>,
}

/// Mutex-guarded list of processes plus the group phase.
pub(crate) struct Registry {
    state: Mutex<State>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                phase: Phase::Idle,
                entries: Vec::new(),
            }),
        }
    }

    /// Appends the process built by `make` from its registration index.
    ///
    /// Returns the entry name (taken from [`Process::name`](crate::Process::name)),
    /// or the current phase if registration is closed (in which case `make`
    /// is not called).
    pub(crate) fn push_with<F>(&self, make: F) -> Result<Arc<str>, Phase>
    where
        F: FnOnce(usize) -> ProcessRef,
    {
        let mut state = self.state.lock();
        if state.phase != Phase::Idle {
            return Err(state.phase);
        }

        let index = state.entries.len();
        let process = make(index);
        let name: Arc<str> = Arc::from(process.name());
        state.entries.push(Entry {
            index,
            name: Arc::clone(&name),
            process,
        });
        Ok(name)
    }

    /// Moves `Idle → Running` and takes the entries.
    ///
    /// Returns `None` if the group already left `Idle`.
    pub(crate) fn begin(&self) -> Option<Vec<Entry>> {
        let mut state = self.state.lock();
        if state.phase != Phase::Idle {
            return None;
        }
        state.phase = Phase::Running;
        Some(std::mem::take(&mut state.entries))
    }

    pub(crate) fn advance(&self, to: Phase) {
        self.state.lock().phase = to;
    }

    pub(crate) fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// Number of processes waiting to be started.
    pub(crate) fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Names of processes waiting to be started, in registration order.
    pub(crate) fn names(&self) -> Vec<Arc<str>> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|e| Arc::clone(&e.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::processes::ProcessFn;
    use std::borrow::Cow;

    fn noop(name: impl Into<Cow<'static, str>>) -> ProcessRef {
        ProcessFn::arc(name, || async { Ok(()) }, |_ctx: Context| async { Ok(()) })
    }

    #[test]
    fn test_push_keeps_order_and_names() {
        let reg = Registry::new();
        reg.push_with(|_| noop("api")).unwrap();
        let name = reg.push_with(|i| noop(format!("process-{i}"))).unwrap();
        assert_eq!(&*name, "process-1");

        assert_eq!(reg.len(), 2);
        let names: Vec<String> = reg.names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["api", "process-1"]);
    }

    #[test]
    fn test_begin_is_single_use() {
        let reg = Registry::new();
        reg.push_with(|_| noop("api")).unwrap();

        let entries = reg.begin().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].index, 0);
        assert_eq!(reg.phase(), Phase::Running);
        assert!(reg.begin().is_none());
    }

    #[test]
    fn test_push_rejected_after_begin() {
        let reg = Registry::new();
        reg.begin().unwrap();

        let rejected = reg.push_with(|_| noop("late"));
        assert_eq!(rejected.unwrap_err(), Phase::Running);
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn test_concurrent_push() {
        let reg = Registry::new();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..50 {
                        reg.push_with(|_| noop("worker")).unwrap();
                    }
                });
            }
        });

        let entries = reg.begin().unwrap();
        assert_eq!(entries.len(), 400);
        assert!(entries.iter().enumerate().all(|(i, e)| e.index == i));
    }
}
