use async_trait::async_trait;

use vigil_domain::{ProbeOutcome, ProbeRequest};

/// Sends one request to the monitored platform. Transport failures are
/// reported as `ProbeOutcome::Failed`, never as errors.
#[async_trait]
pub trait ProbePort: Send + Sync {
    async fn probe(&self, request: ProbeRequest) -> ProbeOutcome;
}

/// Stand-in when no platform URL is configured; every component reads as
/// unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

#[async_trait]
impl ProbePort for NullProbe {
    async fn probe(&self, _request: ProbeRequest) -> ProbeOutcome {
        ProbeOutcome::Failed {
            elapsed_ms: 0,
            error: "platform url not configured".to_string(),
        }
    }
}
