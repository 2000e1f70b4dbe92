use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VigilError, VigilResult};
use crate::status::ComponentType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    #[default]
    Investigating,
    Identified,
    Monitoring,
    Resolved,
}

impl IncidentStatus {
    pub const ALL: [IncidentStatus; 4] = [
        IncidentStatus::Investigating,
        IncidentStatus::Identified,
        IncidentStatus::Monitoring,
        IncidentStatus::Resolved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Identified => "identified",
            IncidentStatus::Monitoring => "monitoring",
            IncidentStatus::Resolved => "resolved",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IncidentStatus::Investigating => "Investigating",
            IncidentStatus::Identified => "Identified",
            IncidentStatus::Monitoring => "Monitoring",
            IncidentStatus::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IncidentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| VigilError::validation("Valid status is required"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    Minor,
    Major,
    Critical,
}

impl IncidentSeverity {
    pub const ALL: [IncidentSeverity; 3] = [
        IncidentSeverity::Minor,
        IncidentSeverity::Major,
        IncidentSeverity::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentSeverity::Minor => "minor",
            IncidentSeverity::Major => "major",
            IncidentSeverity::Critical => "critical",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IncidentSeverity::Minor => "Minor",
            IncidentSeverity::Major => "Major",
            IncidentSeverity::Critical => "Critical",
        }
    }
}

impl fmt::Display for IncidentSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentSeverity {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IncidentSeverity::ALL
            .into_iter()
            .find(|severity| severity.as_str() == s)
            .ok_or_else(|| VigilError::validation("Valid severity is required"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    pub status: IncidentStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub status: IncidentStatus,
    pub severity: IncidentSeverity,
    pub affected_components: Vec<ComponentType>,
    pub updates: Vec<IncidentUpdate>,
    pub started_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub postmortem: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for opening an incident.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIncident {
    pub title: String,
    pub severity: IncidentSeverity,
    pub affected_components: Vec<ComponentType>,
    pub message: Option<String>,
}

impl NewIncident {
    /// Message used for notifications when the admin did not write one.
    pub fn notification_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("We are investigating an issue with {}", self.title))
    }
}

/// Raw admin payload for `POST /api/admin/incidents`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    pub title: Option<String>,
    pub severity: Option<String>,
    pub affected_components: Option<Vec<String>>,
    pub message: Option<String>,
}

impl CreateIncidentRequest {
    pub fn validate(self) -> VigilResult<NewIncident> {
        let title = non_blank(self.title).ok_or_else(|| VigilError::validation("Title is required"))?;
        let severity: IncidentSeverity = self
            .severity
            .as_deref()
            .ok_or_else(|| VigilError::validation("Valid severity is required"))?
            .parse()?;
        let affected_components = parse_components(self.affected_components)?;

        Ok(NewIncident {
            title,
            severity,
            affected_components,
            message: non_blank(self.message),
        })
    }
}

/// Raw admin payload for `PATCH /api/admin/incidents/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateIncidentRequest {
    pub status: Option<String>,
    pub message: Option<String>,
    pub postmortem: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IncidentPatch {
    pub status: Option<IncidentStatus>,
    pub message: Option<String>,
    /// `Some("")` clears an existing postmortem.
    pub postmortem: Option<String>,
}

impl UpdateIncidentRequest {
    pub fn validate(self) -> VigilResult<IncidentPatch> {
        let status: Option<IncidentStatus> = self.status.as_deref().map(str::parse).transpose()?;
        Ok(IncidentPatch {
            status,
            message: non_blank(self.message),
            postmortem: self.postmortem,
        })
    }
}

impl Incident {
    pub fn open(id: String, new: NewIncident, created_by: String, now: DateTime<Utc>) -> Self {
        let updates = new
            .message
            .map(|message| {
                vec![IncidentUpdate {
                    status: IncidentStatus::Investigating,
                    message,
                    timestamp: now,
                }]
            })
            .unwrap_or_default();

        Self {
            id,
            title: new.title,
            status: IncidentStatus::Investigating,
            severity: new.severity,
            affected_components: new.affected_components,
            updates,
            started_at: now,
            resolved_at: None,
            postmortem: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status != IncidentStatus::Resolved
    }

    /// Apply an admin update. A message is only recorded together with a
    /// status; `resolved_at` is stamped on the first move to resolved.
    pub fn apply(&mut self, patch: IncidentPatch, now: DateTime<Utc>) {
        if let Some(status) = patch.status {
            self.status = status;
            if let Some(message) = patch.message {
                self.updates.push(IncidentUpdate {
                    status,
                    message,
                    timestamp: now,
                });
            }
            if status == IncidentStatus::Resolved && self.resolved_at.is_none() {
                self.resolved_at = Some(now);
            }
        }

        if let Some(postmortem) = patch.postmortem {
            self.postmortem = (!postmortem.trim().is_empty()).then_some(postmortem);
        }

        self.updated_at = now;
    }
}

/// Public listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncidentFilter {
    #[default]
    All,
    Active,
    Resolved,
}

impl IncidentFilter {
    /// Unknown values fall back to `All`.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("active") => IncidentFilter::Active,
            Some("resolved") => IncidentFilter::Resolved,
            _ => IncidentFilter::All,
        }
    }

    pub fn matches(self, incident: &Incident) -> bool {
        match self {
            IncidentFilter::All => true,
            IncidentFilter::Active => incident.is_active(),
            IncidentFilter::Resolved => !incident.is_active(),
        }
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn parse_components(raw: Option<Vec<String>>) -> VigilResult<Vec<ComponentType>> {
    let raw = raw
        .filter(|components| !components.is_empty())
        .ok_or_else(|| VigilError::validation("At least one affected component is required"))?;
    let mut components = Vec::with_capacity(raw.len());
    for value in raw {
        let component: ComponentType = value.parse()?;
        if !components.contains(&component) {
            components.push(component);
        }
    }
    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request() -> CreateIncidentRequest {
        CreateIncidentRequest {
            title: Some("  Elevated API errors ".into()),
            severity: Some("major".into()),
            affected_components: Some(vec!["api".into(), "database".into()]),
            message: Some("Looking into it".into()),
        }
    }

    #[test]
    fn create_request_validation() {
        let new = request().validate().unwrap();
        assert_eq!(new.title, "Elevated API errors");
        assert_eq!(new.severity, IncidentSeverity::Major);
        assert_eq!(
            new.affected_components,
            vec![ComponentType::Api, ComponentType::Database]
        );

        let missing_title = CreateIncidentRequest {
            title: Some("   ".into()),
            ..request()
        };
        assert_eq!(
            missing_title.validate().unwrap_err().to_string(),
            "Title is required"
        );

        let bad_severity = CreateIncidentRequest {
            severity: Some("catastrophic".into()),
            ..request()
        };
        assert!(matches!(
            bad_severity.validate(),
            Err(VigilError::Validation(_))
        ));

        let no_components = CreateIncidentRequest {
            affected_components: Some(Vec::new()),
            ..request()
        };
        assert_eq!(
            no_components.validate().unwrap_err().to_string(),
            "At least one affected component is required"
        );

        let unknown_component = CreateIncidentRequest {
            affected_components: Some(vec!["queue".into()]),
            ..request()
        };
        assert_eq!(
            unknown_component.validate().unwrap_err().to_string(),
            "Invalid component: queue"
        );
    }

    #[test]
    fn open_records_initial_update_only_with_message() {
        let now = Utc::now();
        let incident = Incident::open("a".into(), request().validate().unwrap(), "ops@x.io".into(), now);
        assert_eq!(incident.status, IncidentStatus::Investigating);
        assert_eq!(incident.updates.len(), 1);
        assert_eq!(incident.updates[0].message, "Looking into it");

        let silent = NewIncident {
            message: None,
            ..request().validate().unwrap()
        };
        assert_eq!(
            silent.notification_message(),
            "We are investigating an issue with Elevated API errors"
        );
        let incident = Incident::open("b".into(), silent, "ops@x.io".into(), now);
        assert!(incident.updates.is_empty());
    }

    #[test]
    fn updates_append_in_order_and_resolve_once() {
        let start = Utc::now();
        let mut incident =
            Incident::open("a".into(), request().validate().unwrap(), "ops@x.io".into(), start);

        incident.apply(
            IncidentPatch {
                status: Some(IncidentStatus::Identified),
                message: Some("Bad deploy".into()),
                postmortem: None,
            },
            start + Duration::minutes(5),
        );
        let resolved_at = start + Duration::minutes(30);
        incident.apply(
            IncidentPatch {
                status: Some(IncidentStatus::Resolved),
                message: Some("Rolled back".into()),
                postmortem: None,
            },
            resolved_at,
        );
        incident.apply(
            IncidentPatch {
                status: Some(IncidentStatus::Resolved),
                message: None,
                postmortem: Some("Root cause: config drift".into()),
            },
            start + Duration::hours(2),
        );

        let messages: Vec<_> = incident.updates.iter().map(|u| u.message.as_str()).collect();
        assert_eq!(messages, ["Looking into it", "Bad deploy", "Rolled back"]);
        assert_eq!(incident.resolved_at, Some(resolved_at));
        assert_eq!(incident.postmortem.as_deref(), Some("Root cause: config drift"));
        assert!(!incident.is_active());
    }

    #[test]
    fn message_without_status_is_ignored() {
        let now = Utc::now();
        let mut incident =
            Incident::open("a".into(), request().validate().unwrap(), "ops@x.io".into(), now);
        let patch = UpdateIncidentRequest {
            status: None,
            message: Some("orphan".into()),
            postmortem: None,
        }
        .validate()
        .unwrap();
        incident.apply(patch, now);
        assert_eq!(incident.updates.len(), 1);
    }

    #[test]
    fn invalid_patch_status_is_rejected() {
        let patch = UpdateIncidentRequest {
            status: Some("closed".into()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn filter_from_query() {
        assert_eq!(IncidentFilter::from_query(Some("active")), IncidentFilter::Active);
        assert_eq!(IncidentFilter::from_query(Some("bogus")), IncidentFilter::All);
        assert_eq!(IncidentFilter::from_query(None), IncidentFilter::All);
    }
}
