use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::AppState;
use crate::extract::CronCaller;

/// Run one check pass for an external scheduler.
pub(crate) async fn check(_caller: CronCaller, State(state): State<AppState>) -> Response {
    match state.services.monitor.run_pass_and_notify().await {
        Ok(report) => {
            let results: Vec<_> = report
                .results
                .iter()
                .map(|r| {
                    json!({
                        "component": r.component,
                        "status": r.status,
                        "responseTime": r.response_time,
                    })
                })
                .collect();
            Json(json!({
                "success": true,
                "timestamp": report.timestamp,
                "results": results,
                "changes": report.changes.len(),
            }))
            .into_response()
        }
        Err(e) => {
            error!("scheduled check pass failed: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
