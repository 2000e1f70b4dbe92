pub(crate) mod admin;
pub(crate) mod cron;
pub(crate) mod public;
pub(crate) mod subscribe;

use axum::Json;
use serde_json::{Value, json};

pub(crate) async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
