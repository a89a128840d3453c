//! Liveness probing of resolved video links.
//!
//! A probe issues a header-only request and reports whether the link answers
//! with HTTP 200. Transport failures are an outcome, not an error: the caller
//! records them as a dead link and tries again once the cached verdict goes
//! stale.

mod http;

pub use http::HttpProbe;

use async_trait::async_trait;
use thiserror::Error;

/// Result of one liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered 200.
    Works,
    /// The server answered with another status.
    Broken { status: u16 },
    /// No usable response (DNS, TLS, timeout, connection reset, ...).
    Unreachable { reason: String },
}

impl ProbeOutcome {
    pub fn works(&self) -> bool {
        matches!(self, ProbeOutcome::Works)
    }

    /// Label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Works => "probe_ok",
            ProbeOutcome::Broken { .. } => "probe_dead",
            ProbeOutcome::Unreachable { .. } => "probe_unreachable",
        }
    }
}

/// Errors building a probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Checks whether a link currently serves a video.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Name of this probe for logging.
    fn name(&self) -> &str;

    /// Probe `uri` without fetching the response body.
    async fn probe(&self, uri: &str) -> ProbeOutcome;
}
