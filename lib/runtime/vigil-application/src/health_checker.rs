use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use vigil_domain::{ComponentType, HealthCheckResult, ProbeRequest, evaluate};
use vigil_ports::ProbePort;

/// Polls every component once. Probes run concurrently; results come back
/// in `ComponentType::ALL` order.
#[derive(Clone)]
pub struct HealthChecker {
    probe: Arc<dyn ProbePort>,
}

impl HealthChecker {
    pub fn new(probe: Arc<dyn ProbePort>) -> Self {
        Self { probe }
    }

    pub async fn check_component(&self, component: ComponentType) -> HealthCheckResult {
        let outcome = self
            .probe
            .probe(ProbeRequest::for_component(component))
            .await;
        let result = evaluate(component, outcome);
        debug!(
            component = %component,
            status = %result.status,
            response_time = result.response_time,
            status_code = result.status_code,
            "component checked"
        );
        result
    }

    pub async fn run_checks(&self) -> Vec<HealthCheckResult> {
        join_all(
            ComponentType::ALL
                .into_iter()
                .map(|component| self.check_component(component)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProbe;
    use vigil_domain::{ProbeOutcome, StatusLevel};

    #[tokio::test]
    async fn every_component_is_checked_in_order() {
        let probe = ScriptedProbe::healthy()
            .with("/sign-in", ProbeOutcome::Failed {
                elapsed_ms: 10_000,
                error: "timed out".into(),
            });
        let checker = HealthChecker::new(Arc::new(probe));

        let results = checker.run_checks().await;
        let components: Vec<_> = results.iter().map(|r| r.component).collect();
        assert_eq!(components, ComponentType::ALL.to_vec());

        let auth = &results[3];
        assert_eq!(auth.component, ComponentType::Auth);
        assert_eq!(auth.status, StatusLevel::MajorOutage);
        assert!(
            results
                .iter()
                .filter(|r| r.component != ComponentType::Auth)
                .all(|r| r.status == StatusLevel::Operational)
        );
    }
}
