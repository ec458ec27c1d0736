//! Lifecycle observers.

use std::sync::Arc;

use edge_core::{LifecycleObserver, PagePhase, PhaseEvent};
use parking_lot::Mutex;
use serde::Serialize;

/// Emits every phase transition as a tracing event.
///
/// Failures log at WARN, everything else at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl LifecycleObserver for TracingObserver {
    fn on_phase(&self, event: &PhaseEvent) {
        let elapsed_us = event.elapsed.as_micros() as u64;
        match &event.phase {
            PagePhase::Failed(reason) => tracing::warn!(
                controller = event.controller.0,
                page = %event.page,
                environment = %event.environment,
                elapsed_us,
                reason = %reason,
                "page init failed"
            ),
            phase => tracing::info!(
                controller = event.controller.0,
                page = %event.page,
                environment = %event.environment,
                elapsed_us,
                phase = phase.as_label(),
                "page phase"
            ),
        }
    }
}

/// A recorded phase transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedPhase {
    /// Controller id.
    pub controller: u64,
    /// Page name.
    pub page: String,
    /// "server" or "client".
    pub environment: String,
    /// Phase label.
    pub phase: String,
    /// Failure reason, for failed phases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Keeps every phase transition in memory (for debugging and tests).
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    phases: Arc<Mutex<Vec<RecordedPhase>>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded transitions.
    pub fn phases(&self) -> Vec<RecordedPhase> {
        self.phases.lock().clone()
    }

    /// Phase labels for one controller, in order.
    pub fn labels_for(&self, controller: u64) -> Vec<String> {
        self.phases
            .lock()
            .iter()
            .filter(|p| p.controller == controller)
            .map(|p| p.phase.clone())
            .collect()
    }

    /// Recorded transitions as a JSON array.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&*self.phases.lock()).unwrap_or_else(|_| "[]".to_string())
    }
}

impl LifecycleObserver for RecordingObserver {
    fn on_phase(&self, event: &PhaseEvent) {
        let reason = match &event.phase {
            PagePhase::Failed(reason) => Some(reason.clone()),
            _ => None,
        };
        self.phases.lock().push(RecordedPhase {
            controller: event.controller.0,
            page: event.page.clone(),
            environment: event.environment.to_string(),
            phase: event.phase.as_label().to_string(),
            reason,
        });
    }
}
