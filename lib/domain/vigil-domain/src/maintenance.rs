use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VigilError, VigilResult};
use crate::incident::{non_blank, parse_components};
use crate::status::ComponentType;

/// Lifecycle of a maintenance window. Declared in lifecycle order; windows
/// never move backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
}

impl MaintenanceStatus {
    pub const ALL: [MaintenanceStatus; 3] = [
        MaintenanceStatus::Scheduled,
        MaintenanceStatus::InProgress,
        MaintenanceStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MaintenanceStatus::Scheduled => "scheduled",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceStatus {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaintenanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| VigilError::validation("Valid status is required"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Maintenance {
    pub id: String,
    pub title: String,
    pub description: String,
    pub affected_components: Vec<ComponentType>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub status: MaintenanceStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMaintenance {
    pub title: String,
    pub description: String,
    pub affected_components: Vec<ComponentType>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaintenanceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub affected_components: Option<Vec<String>>,
    pub scheduled_start: Option<String>,
    pub scheduled_end: Option<String>,
}

impl CreateMaintenanceRequest {
    pub fn validate(self) -> VigilResult<NewMaintenance> {
        let title =
            non_blank(self.title).ok_or_else(|| VigilError::validation("Title is required"))?;
        let description = non_blank(self.description)
            .ok_or_else(|| VigilError::validation("Description is required"))?;
        let affected_components = parse_components(self.affected_components)?;

        let (Some(start), Some(end)) = (non_blank(self.scheduled_start), non_blank(self.scheduled_end))
        else {
            return Err(VigilError::validation(
                "Scheduled start and end times are required",
            ));
        };
        let scheduled_start = parse_timestamp(&start)?;
        let scheduled_end = parse_timestamp(&end)?;
        if scheduled_end <= scheduled_start {
            return Err(VigilError::validation("End time must be after start time"));
        }

        Ok(NewMaintenance {
            title,
            description,
            affected_components,
            scheduled_start,
            scheduled_end,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMaintenanceRequest {
    pub id: Option<String>,
    pub status: Option<String>,
}

impl UpdateMaintenanceRequest {
    pub fn validate(self) -> VigilResult<(String, MaintenanceStatus)> {
        let id = non_blank(self.id).ok_or_else(|| VigilError::validation("ID is required"))?;
        let status: MaintenanceStatus = self
            .status
            .as_deref()
            .ok_or_else(|| VigilError::validation("Valid status is required"))?
            .parse()?;
        Ok((id, status))
    }
}

impl Maintenance {
    pub fn schedule(id: String, new: NewMaintenance, created_by: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            affected_components: new.affected_components,
            scheduled_start: new.scheduled_start,
            scheduled_end: new.scheduled_end,
            status: MaintenanceStatus::Scheduled,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the window to `status`. Re-applying the current status is a
    /// no-op; going backwards is rejected.
    pub fn transition(&mut self, status: MaintenanceStatus, now: DateTime<Utc>) -> VigilResult<()> {
        if status < self.status {
            return Err(VigilError::validation(format!(
                "Cannot move maintenance from {} to {}",
                self.status, status
            )));
        }
        if status != self.status {
            self.status = status;
            self.updated_at = now;
        }
        Ok(())
    }

    /// Scheduled or running windows that have not ended yet.
    pub fn is_upcoming_or_active(&self, now: DateTime<Utc>) -> bool {
        self.status != MaintenanceStatus::Completed && self.scheduled_end >= now
    }
}

/// Public listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaintenanceFilter {
    #[default]
    All,
    /// Scheduled and not started yet.
    Upcoming,
    Active,
    Completed,
}

impl MaintenanceFilter {
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("upcoming") => MaintenanceFilter::Upcoming,
            Some("active") => MaintenanceFilter::Active,
            Some("completed") => MaintenanceFilter::Completed,
            _ => MaintenanceFilter::All,
        }
    }

    pub fn matches(self, maintenance: &Maintenance, now: DateTime<Utc>) -> bool {
        match self {
            MaintenanceFilter::All => true,
            MaintenanceFilter::Upcoming => {
                maintenance.status == MaintenanceStatus::Scheduled
                    && maintenance.scheduled_start > now
            }
            MaintenanceFilter::Active => maintenance.status == MaintenanceStatus::InProgress,
            MaintenanceFilter::Completed => maintenance.status == MaintenanceStatus::Completed,
        }
    }

    /// Completed windows list newest first, everything else soonest first.
    pub fn newest_first(self) -> bool {
        self == MaintenanceFilter::Completed
    }
}

fn parse_timestamp(raw: &str) -> VigilResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| VigilError::validation("Invalid date format"))
}
