use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use serde::Serialize;

use vigil_domain::uptime::window_start;
use vigil_domain::{
    ComponentType, DailyUptime, UptimeStats, average_response_time, daily_history, summarize,
};
use vigil_ports::StoragePort;

/// Reads checks back out of storage and aggregates them.
#[derive(Clone)]
pub struct UptimeCalculator {
    storage: Arc<dyn StoragePort>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimePoint {
    pub timestamp: DateTime<Utc>,
    pub response_time: u64,
}

impl UptimeCalculator {
    pub fn new(storage: Arc<dyn StoragePort>) -> Self {
        Self { storage }
    }

    pub async fn calculate_uptime(
        &self,
        component: ComponentType,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<UptimeStats> {
        let checks = self
            .storage
            .checks_since(component, window_start(now, days))
            .await?;
        Ok(summarize(checks.iter().map(|check| check.status)))
    }

    pub async fn uptime_for_all_components(
        &self,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<ComponentType, UptimeStats>> {
        let stats = try_join_all(ComponentType::ALL.into_iter().map(|component| async move {
            self.calculate_uptime(component, days, now)
                .await
                .map(|stats| (component, stats))
        }))
        .await?;
        Ok(stats.into_iter().collect())
    }

    pub async fn daily_history(
        &self,
        component: ComponentType,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<DailyUptime>> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let today = now.date_naive();
        let first_day = today - Duration::days(i64::from(days) - 1);
        let since = first_day.and_time(chrono::NaiveTime::MIN).and_utc();
        let checks = self.storage.checks_since(component, since).await?;
        Ok(daily_history(&checks, today, days))
    }

    pub async fn average_response_time(
        &self,
        component: ComponentType,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let checks = self.storage.checks_since(component, now - window).await?;
        Ok(average_response_time(&checks))
    }

    pub async fn response_time_history(
        &self,
        component: ComponentType,
        hours: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<ResponseTimePoint>> {
        let since = now - Duration::hours(i64::from(hours));
        let checks = self.storage.checks_since(component, since).await?;
        Ok(checks
            .into_iter()
            .map(|check| ResponseTimePoint {
                timestamp: check.timestamp,
                response_time: check.response_time,
            })
            .collect())
    }
}
