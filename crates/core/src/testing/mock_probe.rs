//! Mock liveness probe for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::probe::{LivenessProbe, ProbeOutcome};

/// Mock implementation of the LivenessProbe trait.
///
/// Every link answers `Works` unless configured otherwise. All probed URIs
/// are recorded in call order.
///
/// # Example
///
/// ```rust,ignore
/// use vidcanon_core::testing::MockProbe;
///
/// let probe = MockProbe::new();
/// probe.set_outcome("http://x/dead.mp4", ProbeOutcome::Broken { status: 404 });
///
/// assert!(!probe.probe("http://x/dead.mp4").await.works());
/// assert_eq!(probe.probe_count("http://x/dead.mp4"), 1);
/// ```
pub struct MockProbe {
    outcomes: Mutex<HashMap<String, ProbeOutcome>>,
    default_outcome: Mutex<ProbeOutcome>,
    calls: Mutex<Vec<String>>,
}

impl std::fmt::Debug for MockProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProbe")
            .field("calls", &self.calls())
            .finish()
    }
}

impl Default for MockProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProbe {
    /// Create a probe that reports every link as working.
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(HashMap::new()),
            default_outcome: Mutex::new(ProbeOutcome::Works),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set the outcome for one URI.
    pub fn set_outcome(&self, uri: &str, outcome: ProbeOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(uri.to_string(), outcome);
    }

    /// Set the outcome for URIs without an explicit entry.
    pub fn set_default_outcome(&self, outcome: ProbeOutcome) {
        *self.default_outcome.lock().unwrap() = outcome;
    }

    /// All probed URIs in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// How often `uri` was probed.
    pub fn probe_count(&self, uri: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == uri).count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl LivenessProbe for MockProbe {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, uri: &str) -> ProbeOutcome {
        self.calls.lock().unwrap().push(uri.to_string());
        let configured = self.outcomes.lock().unwrap().get(uri).cloned();
        configured.unwrap_or_else(|| self.default_outcome.lock().unwrap().clone())
    }
}
