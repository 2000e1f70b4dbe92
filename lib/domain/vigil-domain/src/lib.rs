//! Domain models and invariants.

pub mod change;
pub mod check;
pub mod classify;
pub mod config;
pub mod error;
pub mod incident;
pub mod maintenance;
pub mod status;
pub mod subscriber;
pub mod uptime;

pub use change::{StatusChange, detect_changes, worst_new_status};
pub use check::{
    HealthCheckResult, ProbeMethod, ProbeOutcome, ProbeRequest, StatusCheck, empty_details,
    evaluate,
};
pub use classify::{DEGRADED_THRESHOLD_MS, UNREACHABLE_STATUS_CODE, classify};
pub use config::{
    AdminCredential, AuthConfig, ChecksConfig, NotificationsConfig, PlatformConfig, ServerConfig,
    StorageConfig, VigilConfig, config_path,
};
pub use error::{VigilError, VigilResult};
pub use incident::{
    CreateIncidentRequest, Incident, IncidentFilter, IncidentPatch, IncidentSeverity,
    IncidentStatus, IncidentUpdate, NewIncident, UpdateIncidentRequest,
};
pub use maintenance::{
    CreateMaintenanceRequest, Maintenance, MaintenanceFilter, MaintenanceStatus, NewMaintenance,
    UpdateMaintenanceRequest,
};
pub use status::{ComponentType, StatusLevel, overall_status, overall_status_message};
pub use subscriber::{NewSubscription, SubscribeRequest, Subscriber, TokenRequest, is_valid_email};
pub use uptime::{DailyUptime, UptimeStats, average_response_time, daily_history, summarize};
