use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::interval;
use tracing::{error, info};

use vigil_domain::{ComponentType, HealthCheckResult, StatusChange, StatusLevel, detect_changes};
use vigil_ports::StoragePort;

use crate::health_checker::HealthChecker;
use crate::notifier::{FanOut, NotificationService};

#[derive(Debug, Clone, Serialize)]
pub struct CheckPassReport {
    pub timestamp: DateTime<Utc>,
    pub results: Vec<HealthCheckResult>,
    pub changes: Vec<StatusChange>,
}

/// Runs check passes: poll, diff against stored state, persist, notify.
#[derive(Clone)]
pub struct Monitor {
    checker: HealthChecker,
    storage: Arc<dyn StoragePort>,
    notifier: NotificationService,
    retention_days: u32,
}

impl Monitor {
    pub fn new(
        checker: HealthChecker,
        storage: Arc<dyn StoragePort>,
        notifier: NotificationService,
        retention_days: u32,
    ) -> Self {
        Self {
            checker,
            storage,
            notifier,
            retention_days,
        }
    }

    /// Last stored status of each component that has any data.
    pub async fn latest_statuses(&self) -> Result<HashMap<ComponentType, StatusLevel>> {
        let mut statuses = HashMap::new();
        for component in ComponentType::ALL {
            if let Some(check) = self.storage.latest_check(component).await? {
                statuses.insert(component, check.status);
            }
        }
        Ok(statuses)
    }

    /// One pass without notifications. Changes are computed against the
    /// state stored before this pass's results are written.
    pub async fn run_pass(&self) -> Result<CheckPassReport> {
        info!("starting health checks");
        let results = self.checker.run_checks().await;
        let previous = self
            .latest_statuses()
            .await
            .context("failed to load previous statuses")?;
        let changes = detect_changes(&previous, &results);

        let timestamp = Utc::now();
        let checks = results
            .iter()
            .cloned()
            .map(|result| result.into_check(timestamp))
            .collect();
        self.storage
            .insert_checks(checks)
            .await
            .context("failed to save check results")?;

        info!(
            "health checks completed, {} status changes detected",
            changes.len()
        );
        Ok(CheckPassReport {
            timestamp,
            results,
            changes,
        })
    }

    /// One pass, then fan out any changes in the background.
    pub async fn run_pass_and_notify(&self) -> Result<CheckPassReport> {
        let report = self.run_pass().await?;
        if !report.changes.is_empty() {
            info!(changes = ?report.changes, "status changes detected");
            let notifier = self.notifier.clone();
            let changes = report.changes.clone();
            tokio::spawn(async move {
                notifier.notify_status_change(&changes).await;
            });
        }
        Ok(report)
    }

    /// Deliver change notifications and wait for the fan-out to finish.
    pub async fn notify(&self, changes: &[StatusChange]) -> FanOut {
        self.notifier.notify_status_change(changes).await
    }

    pub async fn prune(&self, now: DateTime<Utc>) -> Result<u64> {
        let cutoff = vigil_domain::uptime::window_start(now, self.retention_days);
        let pruned = self.storage.prune_checks_before(cutoff).await?;
        if pruned > 0 {
            info!("pruned {pruned} checks older than {cutoff}");
        }
        Ok(pruned)
    }

    pub async fn run_polling_loop(&self, every: Duration) {
        let mut timer = interval(every);
        loop {
            timer.tick().await;
            if let Err(e) = self.run_pass_and_notify().await {
                error!("check pass failed: {e:#}");
            }
        }
    }

    pub async fn run_retention_loop(&self) {
        let mut timer = interval(Duration::from_secs(60 * 60));
        loop {
            timer.tick().await;
            if let Err(e) = self.prune(Utc::now()).await {
                error!("retention prune failed: {e:#}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::SiteInfo;
    use crate::testing::{RecordingChat, RecordingMailer, ScriptedProbe};
    use chrono::Duration as ChronoDuration;
    use vigil_domain::{ProbeOutcome, StatusCheck};
    use vigil_ports::{InMemoryStorage, StatusCheckStore};

    fn monitor(storage: InMemoryStorage, probe: ScriptedProbe) -> Monitor {
        let storage: Arc<dyn StoragePort> = Arc::new(storage);
        let notifier = NotificationService::new(
            storage.clone(),
            Arc::new(RecordingMailer::default()),
            vec![Arc::new(RecordingChat::new("slack"))],
            SiteInfo::new("Status", "http://localhost"),
        );
        Monitor::new(HealthChecker::new(Arc::new(probe)), storage, notifier, 90)
    }

    #[tokio::test]
    async fn first_pass_reports_only_unhealthy_components() {
        let storage = InMemoryStorage::new();
        let probe = ScriptedProbe::healthy().with(
            "/api/health/system",
            ProbeOutcome::Response {
                status_code: 502,
                elapsed_ms: 40,
                body: None,
            },
        );
        let report = monitor(storage.clone(), probe).run_pass().await.unwrap();

        assert_eq!(report.results.len(), 6);
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].component, ComponentType::Payments);
        assert_eq!(report.changes[0].new_status, StatusLevel::MajorOutage);

        let stored = storage.latest_check(ComponentType::Payments).await.unwrap().unwrap();
        assert_eq!(stored.status, StatusLevel::MajorOutage);
        assert_eq!(stored.timestamp, report.timestamp);
    }

    #[tokio::test]
    async fn recovery_is_a_change_and_steady_state_is_not() {
        let storage = InMemoryStorage::new();
        storage
            .insert_checks(vec![StatusCheck::new(
                Utc::now() - ChronoDuration::minutes(5),
                ComponentType::Database,
                StatusLevel::MajorOutage,
                10,
                500,
            )])
            .await
            .unwrap();

        let monitor = monitor(storage, ScriptedProbe::healthy());
        let first = monitor.run_pass_and_notify().await.unwrap();
        assert_eq!(first.changes.len(), 1);
        assert_eq!(first.changes[0].previous_status, StatusLevel::MajorOutage);
        assert_eq!(first.changes[0].new_status, StatusLevel::Operational);

        let second = monitor.run_pass().await.unwrap();
        assert!(second.changes.is_empty());
    }

    #[tokio::test]
    async fn prune_uses_retention_window() {
        let storage = InMemoryStorage::new();
        let now = Utc::now();
        storage
            .insert_checks(vec![
                StatusCheck::new(now - ChronoDuration::days(100), ComponentType::Api, StatusLevel::Operational, 1, 200),
                StatusCheck::new(now - ChronoDuration::days(10), ComponentType::Api, StatusLevel::Operational, 1, 200),
            ])
            .await
            .unwrap();
        let pruned = monitor(storage, ScriptedProbe::healthy()).prune(now).await.unwrap();
        assert_eq!(pruned, 1);
    }
}
