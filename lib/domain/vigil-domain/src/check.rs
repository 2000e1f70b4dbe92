use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::classify::{UNREACHABLE_STATUS_CODE, classify};
use crate::status::{ComponentType, StatusLevel};

/// Result of probing one component, before it is timestamped and stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub component: ComponentType,
    pub status: StatusLevel,
    pub response_time: u64,
    pub status_code: u16,
    #[serde(default = "empty_details")]
    pub details: Value,
}

impl HealthCheckResult {
    pub fn into_check(self, timestamp: DateTime<Utc>) -> StatusCheck {
        StatusCheck {
            timestamp,
            component: self.component,
            status: self.status,
            response_time: self.response_time,
            status_code: self.status_code,
            details: self.details,
        }
    }
}

/// A stored, timestamped check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCheck {
    pub timestamp: DateTime<Utc>,
    pub component: ComponentType,
    pub status: StatusLevel,
    /// Milliseconds.
    pub response_time: u64,
    pub status_code: u16,
    #[serde(default = "empty_details")]
    pub details: Value,
}

impl StatusCheck {
    pub fn new(
        timestamp: DateTime<Utc>,
        component: ComponentType,
        status: StatusLevel,
        response_time: u64,
        status_code: u16,
    ) -> Self {
        Self {
            timestamp,
            component,
            status,
            response_time,
            status_code,
            details: empty_details(),
        }
    }
}

pub fn empty_details() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Get,
    Head,
}

/// Which upstream endpoint stands in for a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRequest {
    pub method: ProbeMethod,
    pub path: &'static str,
}

impl ProbeRequest {
    pub fn for_component(component: ComponentType) -> Self {
        let (method, path) = match component {
            ComponentType::Api => (ProbeMethod::Get, "/api/health"),
            ComponentType::Database => (ProbeMethod::Get, "/api/health/ready"),
            // The dedicated cache endpoint needs a session; the main health
            // report carries a cache section instead.
            ComponentType::Cache => (ProbeMethod::Get, "/api/health"),
            ComponentType::Auth => (ProbeMethod::Head, "/sign-in"),
            ComponentType::Payments => (ProbeMethod::Get, "/api/health/system"),
            ComponentType::Storage => (ProbeMethod::Head, "/"),
        };
        Self { method, path }
    }
}

/// What came back from the wire. `body` is `None` for HEAD requests and for
/// bodies that are not JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Response {
        status_code: u16,
        elapsed_ms: u64,
        body: Option<Value>,
    },
    Failed {
        elapsed_ms: u64,
        error: String,
    },
}

/// Turn a raw probe outcome into a classified result for `component`.
pub fn evaluate(component: ComponentType, outcome: ProbeOutcome) -> HealthCheckResult {
    let (status_code, elapsed_ms, body) = match outcome {
        ProbeOutcome::Failed { elapsed_ms, error } => {
            return HealthCheckResult {
                component,
                status: StatusLevel::MajorOutage,
                response_time: elapsed_ms,
                status_code: UNREACHABLE_STATUS_CODE,
                details: json!({ "error": error }),
            };
        }
        ProbeOutcome::Response {
            status_code,
            elapsed_ms,
            body,
        } => (status_code, elapsed_ms, body),
    };

    let baseline = classify(status_code, elapsed_ms);
    let body = body.unwrap_or_else(empty_details);

    let (status, details) = match component {
        ComponentType::Database => {
            let disconnected = body
                .pointer("/checks/database/connected")
                .and_then(Value::as_bool)
                == Some(false);
            if disconnected {
                (StatusLevel::MajorOutage, body)
            } else {
                (baseline, body)
            }
        }
        ComponentType::Cache => {
            let cache = body.pointer("/checks/cache").cloned();
            let status = match cache
                .as_ref()
                .and_then(|cache| cache.get("status"))
                .and_then(Value::as_str)
            {
                Some("unhealthy") => StatusLevel::MajorOutage,
                Some("degraded") => baseline.max(StatusLevel::Degraded),
                Some(_) | None => baseline,
            };
            (status, json!({ "cache": cache.unwrap_or_else(empty_details) }))
        }
        ComponentType::Payments => {
            let stripe_configured = body
                .pointer("/environment/stripeConfigured")
                .and_then(Value::as_bool);
            if stripe_configured == Some(false) {
                (
                    StatusLevel::PartialOutage,
                    json!({ "stripeConfigured": false }),
                )
            } else {
                (baseline, body)
            }
        }
        ComponentType::Auth | ComponentType::Storage => (baseline, empty_details()),
        ComponentType::Api => (baseline, body),
    };

    HealthCheckResult {
        component,
        status,
        response_time: elapsed_ms,
        status_code,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: Value) -> ProbeOutcome {
        ProbeOutcome::Response {
            status_code: 200,
            elapsed_ms: 120,
            body: Some(body),
        }
    }

    #[test]
    fn unreachable_probe_is_major_outage_with_error_detail() {
        let result = evaluate(
            ComponentType::Api,
            ProbeOutcome::Failed {
                elapsed_ms: 10_000,
                error: "operation timed out".into(),
            },
        );
        assert_eq!(result.status, StatusLevel::MajorOutage);
        assert_eq!(result.status_code, 0);
        assert_eq!(result.response_time, 10_000);
        assert_eq!(result.details["error"], "operation timed out");
    }

    #[test]
    fn disconnected_database_overrides_healthy_status_code() {
        let body = json!({ "checks": { "database": { "connected": false } } });
        let result = evaluate(ComponentType::Database, ok(body.clone()));
        assert_eq!(result.status, StatusLevel::MajorOutage);
        assert_eq!(result.status_code, 200);
        assert_eq!(result.details, body);
    }

    #[test]
    fn cache_status_comes_from_health_report() {
        let degraded = json!({ "checks": { "cache": { "status": "degraded" } } });
        let result = evaluate(ComponentType::Cache, ok(degraded));
        assert_eq!(result.status, StatusLevel::Degraded);
        assert_eq!(result.details, json!({ "cache": { "status": "degraded" } }));

        let unhealthy = json!({ "checks": { "cache": { "status": "unhealthy" } } });
        assert_eq!(
            evaluate(ComponentType::Cache, ok(unhealthy)).status,
            StatusLevel::MajorOutage
        );
    }

    #[test]
    fn degraded_cache_report_never_lowers_the_http_tier() {
        let outcome = ProbeOutcome::Response {
            status_code: 503,
            elapsed_ms: 40,
            body: Some(json!({ "checks": { "cache": { "status": "degraded" } } })),
        };
        assert_eq!(
            evaluate(ComponentType::Cache, outcome).status,
            StatusLevel::MajorOutage
        );

        let outcome = ProbeOutcome::Response {
            status_code: 500,
            elapsed_ms: 40,
            body: Some(json!({ "checks": { "cache": { "status": "healthy" } } })),
        };
        assert_eq!(
            evaluate(ComponentType::Cache, outcome).status,
            StatusLevel::MajorOutage
        );
    }

    #[test]
    fn cache_without_report_falls_back_to_classifier() {
        let outcome = ProbeOutcome::Response {
            status_code: 503,
            elapsed_ms: 40,
            body: None,
        };
        let result = evaluate(ComponentType::Cache, outcome);
        assert_eq!(result.status, StatusLevel::MajorOutage);
        assert_eq!(result.details, json!({ "cache": {} }));
    }

    #[test]
    fn unconfigured_stripe_is_partial_outage() {
        let body = json!({ "environment": { "stripeConfigured": false } });
        let result = evaluate(ComponentType::Payments, ok(body));
        assert_eq!(result.status, StatusLevel::PartialOutage);
        assert_eq!(result.details, json!({ "stripeConfigured": false }));
    }

    #[test]
    fn head_probes_keep_no_details() {
        let outcome = ProbeOutcome::Response {
            status_code: 200,
            elapsed_ms: 2_500,
            body: None,
        };
        let result = evaluate(ComponentType::Storage, outcome);
        assert_eq!(result.status, StatusLevel::Degraded);
        assert_eq!(result.details, empty_details());
    }

    #[test]
    fn probe_requests_cover_every_component() {
        assert_eq!(
            ProbeRequest::for_component(ComponentType::Auth),
            ProbeRequest {
                method: ProbeMethod::Head,
                path: "/sign-in"
            }
        );
        assert_eq!(
            ProbeRequest::for_component(ComponentType::Database).path,
            "/api/health/ready"
        );
    }
}
