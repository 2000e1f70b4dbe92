use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use vigil_domain::{
    ComponentType, DailyUptime, IncidentFilter, MaintenanceFilter, StatusLevel, overall_status,
    overall_status_message,
};
use vigil_ports::StoragePort;

use crate::uptime::UptimeCalculator;

pub const MAX_HISTORY_DAYS: u32 = 90;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    pub component: ComponentType,
    pub name: &'static str,
    pub status: StatusLevel,
    pub status_label: &'static str,
    pub response_time: u64,
    pub updated_at: Option<DateTime<Utc>>,
    pub uptime30d: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOverview {
    pub status: StatusLevel,
    pub status_label: &'static str,
    pub message: &'static str,
    pub components: Vec<ComponentStatus>,
    pub active_incidents: u64,
    pub upcoming_maintenance: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UptimeWindows {
    #[serde(rename = "24h")]
    pub day: f64,
    #[serde(rename = "7d")]
    pub week: f64,
    #[serde(rename = "30d")]
    pub month: f64,
    #[serde(rename = "90d")]
    pub quarter: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDetail {
    pub component: ComponentType,
    pub name: &'static str,
    pub status: StatusLevel,
    pub status_label: &'static str,
    pub response_time: u64,
    pub avg_response_time24h: u64,
    pub uptime: UptimeWindows,
    pub last_checked: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentHistory {
    pub component: ComponentType,
    pub history: Vec<DailyUptime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    pub days: u32,
    pub history: Vec<ComponentHistory>,
    pub updated_at: DateTime<Utc>,
}

/// Read side of the status page.
#[derive(Clone)]
pub struct StatusService {
    storage: Arc<dyn StoragePort>,
    uptime: UptimeCalculator,
}

impl StatusService {
    pub fn new(storage: Arc<dyn StoragePort>) -> Self {
        let uptime = UptimeCalculator::new(storage.clone());
        Self { storage, uptime }
    }

    pub fn uptime(&self) -> &UptimeCalculator {
        &self.uptime
    }

    pub async fn overview(&self, now: DateTime<Utc>) -> Result<StatusOverview> {
        let mut components = Vec::with_capacity(ComponentType::ALL.len());
        for component in ComponentType::ALL {
            let latest = self.storage.latest_check(component).await?;
            let uptime = self.uptime.calculate_uptime(component, 30, now).await?;
            let status = latest.as_ref().map(|c| c.status).unwrap_or_default();
            components.push(ComponentStatus {
                component,
                name: component.label(),
                status,
                status_label: status.label(),
                response_time: latest.as_ref().map(|c| c.response_time).unwrap_or(0),
                updated_at: latest.as_ref().map(|c| c.timestamp),
                uptime30d: uptime.percentage,
            });
        }

        let status = overall_status(components.iter().map(|c| c.status));
        let active_incidents = self.storage.count_incidents(IncidentFilter::Active).await?;
        let upcoming_maintenance = self
            .storage
            .list_maintenance(MaintenanceFilter::All, now, false, u64::MAX)
            .await?
            .iter()
            .filter(|m| m.is_upcoming_or_active(now))
            .count() as u64;

        Ok(StatusOverview {
            status,
            status_label: status.label(),
            message: overall_status_message(status),
            components,
            active_incidents,
            upcoming_maintenance,
            updated_at: now,
        })
    }

    pub async fn component_details(&self, now: DateTime<Utc>) -> Result<Vec<ComponentDetail>> {
        let mut details = Vec::with_capacity(ComponentType::ALL.len());
        for component in ComponentType::ALL {
            let latest = self.storage.latest_check(component).await?;
            let (day, week, month, quarter) = tokio::try_join!(
                self.uptime.calculate_uptime(component, 1, now),
                self.uptime.calculate_uptime(component, 7, now),
                self.uptime.calculate_uptime(component, 30, now),
                self.uptime.calculate_uptime(component, 90, now),
            )?;
            let avg_response_time24h = self
                .uptime
                .average_response_time(component, Duration::hours(24), now)
                .await?;
            let status = latest.as_ref().map(|c| c.status).unwrap_or_default();

            details.push(ComponentDetail {
                component,
                name: component.label(),
                status,
                status_label: status.label(),
                response_time: latest.as_ref().map(|c| c.response_time).unwrap_or(0),
                avg_response_time24h,
                uptime: UptimeWindows {
                    day: day.percentage,
                    week: week.percentage,
                    month: month.percentage,
                    quarter: quarter.percentage,
                },
                last_checked: latest.map(|c| c.timestamp),
            });
        }
        Ok(details)
    }

    /// Daily history for one component or all of them. `days` is clamped
    /// to `1..=90`.
    pub async fn history(
        &self,
        component: Option<ComponentType>,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<HistoryReport> {
        let days = days.clamp(1, MAX_HISTORY_DAYS);
        let components = match component {
            Some(component) => vec![component],
            None => ComponentType::ALL.to_vec(),
        };

        let mut history = Vec::with_capacity(components.len());
        for component in components {
            history.push(ComponentHistory {
                component,
                history: self.uptime.daily_history(component, days, now).await?,
            });
        }

        Ok(HistoryReport {
            days,
            history,
            updated_at: now,
        })
    }
}
