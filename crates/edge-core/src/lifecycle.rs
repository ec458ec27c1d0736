//! Controller lifecycle tracking.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::context::ControllerId;
use crate::environment::EnvironmentKind;

/// Lifecycle phases of a page controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagePhase {
    /// Constructed, `init` not called yet.
    Created,
    /// `init` in progress.
    Initializing,
    /// Server render produced state and output.
    ServerRendered,
    /// Client store bound and rendered.
    ClientReady,
    /// Server guard suppressed rendering; the fallback view was returned.
    Suppressed,
    /// Creation guard returned false; nothing rendered.
    Aborted,
    /// `init` failed.
    Failed(String),
    /// Subscriptions torn down.
    Destroyed,
    /// Brought back by history navigation.
    Reactivated,
}

impl PagePhase {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Initializing => "initializing",
            Self::ServerRendered => "server_rendered",
            Self::ClientReady => "client_ready",
            Self::Suppressed => "suppressed",
            Self::Aborted => "aborted",
            Self::Failed(_) => "failed",
            Self::Destroyed => "destroyed",
            Self::Reactivated => "reactivated",
        }
    }

    /// True when the controller has a bound, live store.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::ClientReady | Self::Reactivated)
    }
}

impl fmt::Display for PagePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            other => f.write_str(other.as_label()),
        }
    }
}

/// Named timing marks relative to a start instant.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context starting now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Time from start to a mark.
    pub fn since_start(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }

    /// Time between two marks.
    pub fn between(&self, from: &str, to: &str) -> Option<Duration> {
        let from = self.marks.get(from)?;
        let to = self.marks.get(to)?;
        Some(to.saturating_duration_since(*from))
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A phase transition reported to observers.
#[derive(Debug, Clone)]
pub struct PhaseEvent {
    /// Controller that transitioned.
    pub controller: ControllerId,
    /// Page name.
    pub page: String,
    /// Side the controller runs on.
    pub environment: EnvironmentKind,
    /// New phase.
    pub phase: PagePhase,
    /// Time since the controller was created.
    pub elapsed: Duration,
}

/// Observer trait for lifecycle events.
pub trait LifecycleObserver: Send + Sync {
    /// Called on every phase transition.
    fn on_phase(&self, event: &PhaseEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_phase_labels() {
        assert_eq!(PagePhase::ClientReady.as_label(), "client_ready");
        assert_eq!(PagePhase::Failed("boom".into()).to_string(), "failed: boom");
        assert_eq!(PagePhase::Destroyed.to_string(), "destroyed");
    }

    #[test]
    fn test_page_phase_is_active() {
        assert!(PagePhase::ClientReady.is_active());
        assert!(PagePhase::Reactivated.is_active());
        assert!(!PagePhase::ServerRendered.is_active());
        assert!(!PagePhase::Destroyed.is_active());
    }

    #[test]
    fn test_timing_marks() {
        let mut timing = TimingContext::new();
        timing.mark("guard");
        timing.mark("ready");

        assert!(timing.since_start("guard").is_some());
        assert!(timing.between("guard", "ready").is_some());
        assert!(timing.between("guard", "missing").is_none());
        assert!(timing.elapsed() >= timing.since_start("guard").unwrap());
    }
}
