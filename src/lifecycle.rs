//! Producer availability.
//!
//! The host reports application start/stop edges for every application it
//! watches. [`ProducerWatch`] keeps only the edges of the telemetry producer
//! and latches them into a single "is the producer running" flag.

use tracing::{debug, info};

/// A start or stop edge for some application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Started(String),
    Stopped(String),
}

/// Latched availability of the producer process.
#[derive(Debug, Clone)]
pub struct ProducerWatch {
    application: String,
    available: bool,
}

impl ProducerWatch {
    /// Watch for `application`. An empty name accepts edges from any
    /// application.
    pub fn new(application: impl Into<String>, initially_available: bool) -> Self {
        Self {
            application: application.into(),
            available: initially_available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Apply one lifecycle edge. Returns true when the latch changed.
    pub fn apply(&mut self, event: &LifecycleEvent) -> bool {
        let (application, running) = match event {
            LifecycleEvent::Started(app) => (app, true),
            LifecycleEvent::Stopped(app) => (app, false),
        };

        if !self.matches(application) {
            debug!(%application, "ignoring lifecycle edge of unrelated application");
            return false;
        }

        let changed = self.available != running;
        self.available = running;
        if changed {
            info!(%application, running, "producer availability changed");
        }
        changed
    }

    fn matches(&self, application: &str) -> bool {
        self.application.is_empty() || self.application.eq_ignore_ascii_case(application)
    }
}
