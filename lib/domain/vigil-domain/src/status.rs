use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VigilError;

/// A monitored platform subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Api,
    Database,
    Cache,
    Auth,
    Payments,
    Storage,
}

impl ComponentType {
    /// Every monitored component, in display order.
    pub const ALL: [ComponentType; 6] = [
        ComponentType::Api,
        ComponentType::Database,
        ComponentType::Cache,
        ComponentType::Auth,
        ComponentType::Payments,
        ComponentType::Storage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Api => "api",
            ComponentType::Database => "database",
            ComponentType::Cache => "cache",
            ComponentType::Auth => "auth",
            ComponentType::Payments => "payments",
            ComponentType::Storage => "storage",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ComponentType::Api => "API",
            ComponentType::Database => "Database",
            ComponentType::Cache => "Cache",
            ComponentType::Auth => "Authentication",
            ComponentType::Payments => "Payments",
            ComponentType::Storage => "File Storage",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentType::ALL
            .into_iter()
            .find(|component| component.as_str() == s)
            .ok_or_else(|| VigilError::validation(format!("Invalid component: {s}")))
    }
}

/// Severity tier of a component. Variants are declared in increasing
/// severity so `Ord` gives the worst-of ordering directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    #[default]
    Operational,
    Degraded,
    PartialOutage,
    MajorOutage,
}

impl StatusLevel {
    pub const ALL: [StatusLevel; 4] = [
        StatusLevel::Operational,
        StatusLevel::Degraded,
        StatusLevel::PartialOutage,
        StatusLevel::MajorOutage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusLevel::Operational => "operational",
            StatusLevel::Degraded => "degraded",
            StatusLevel::PartialOutage => "partial_outage",
            StatusLevel::MajorOutage => "major_outage",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusLevel::Operational => "Operational",
            StatusLevel::Degraded => "Degraded Performance",
            StatusLevel::PartialOutage => "Partial Outage",
            StatusLevel::MajorOutage => "Major Outage",
        }
    }

    /// Operational and degraded checks count toward uptime.
    pub fn is_up(self) -> bool {
        matches!(self, StatusLevel::Operational | StatusLevel::Degraded)
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusLevel {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatusLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| VigilError::validation(format!("Invalid status level: {s}")))
    }
}

/// Worst tier present among `statuses`; operational when empty.
pub fn overall_status<I>(statuses: I) -> StatusLevel
where
    I: IntoIterator<Item = StatusLevel>,
{
    statuses.into_iter().max().unwrap_or_default()
}

pub fn overall_status_message(status: StatusLevel) -> &'static str {
    match status {
        StatusLevel::Operational => "All Systems Operational",
        StatusLevel::Degraded => "Some Systems Degraded",
        StatusLevel::PartialOutage => "Partial System Outage",
        StatusLevel::MajorOutage => "Major System Outage",
    }
}
