//! HEAD-request probe backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode};
use tracing::{debug, warn};

use super::{LivenessProbe, ProbeError, ProbeOutcome};
use crate::config::AvailabilityConfig;

/// Probes links with `HEAD` requests.
///
/// Redirects are not followed: only a direct 200 counts as working.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(config: &AvailabilityConfig) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.probe_timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl LivenessProbe for HttpProbe {
    fn name(&self) -> &str {
        "http-head"
    }

    async fn probe(&self, uri: &str) -> ProbeOutcome {
        match self.client.head(uri).send().await {
            Ok(response) => {
                let status = response.status();
                debug!("HEAD {} -> {}", uri, status);
                if status == StatusCode::OK {
                    ProbeOutcome::Works
                } else {
                    ProbeOutcome::Broken {
                        status: status.as_u16(),
                    }
                }
            }
            Err(e) => {
                warn!("HEAD {} failed: {}", uri, e);
                ProbeOutcome::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }
}
