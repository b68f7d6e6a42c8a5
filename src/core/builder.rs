use std::sync::Arc;

use crate::config::Config;
use crate::subscribers::Subscribe;

use super::group::Group;

/// Builder for constructing a [`Group`] with optional features.
pub struct GroupBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl GroupBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events (processes starting, failing,
    /// shutting down) through dedicated workers with bounded queues. Workers
    /// are spawned when [`Group::wait`] begins.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the group.
    ///
    /// Does not need a tokio runtime; nothing is spawned until [`Group::wait`].
    pub fn build(self) -> Group {
        Group::new_internal(self.cfg, self.subscribers)
    }
}
