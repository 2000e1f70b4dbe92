use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use vigil_domain::{
    CreateIncidentRequest, CreateMaintenanceRequest, Incident, Maintenance,
    UpdateIncidentRequest, UpdateMaintenanceRequest,
};

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::{Admin, json_body};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IdQuery {
    id: Option<String>,
}

fn deleted() -> Json<Value> {
    Json(json!({ "success": true }))
}

pub(crate) async fn list_incidents(_admin: Admin, State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let incidents = state.services.incidents.list_recent().await?;
    Ok(Json(json!({ "incidents": incidents })))
}

pub(crate) async fn create_incident(
    Admin(admin): Admin,
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<Value>> {
    let request: CreateIncidentRequest = json_body(&body)?;
    let incident = state
        .services
        .incidents
        .create(request, &admin.email, Utc::now())
        .await?;
    Ok(Json(json!({ "incident": incident })))
}

pub(crate) async fn get_incident(
    _admin: Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Incident>> {
    Ok(Json(state.services.incidents.get(&id).await?))
}

pub(crate) async fn update_incident(
    _admin: Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> ApiResult<Json<Incident>> {
    let request: UpdateIncidentRequest = json_body(&body)?;
    let incident = state
        .services
        .incidents
        .update(&id, request, Utc::now())
        .await?;
    Ok(Json(incident))
}

pub(crate) async fn delete_incident(
    _admin: Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.services.incidents.delete(&id).await?;
    Ok(deleted())
}

pub(crate) async fn list_maintenance(
    _admin: Admin,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let maintenance = state.services.maintenance.list_recent(Utc::now()).await?;
    Ok(Json(json!({ "maintenance": maintenance })))
}

pub(crate) async fn create_maintenance(
    Admin(admin): Admin,
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<Value>> {
    let request: CreateMaintenanceRequest = json_body(&body)?;
    let maintenance = state
        .services
        .maintenance
        .schedule(request, &admin.email, Utc::now())
        .await?;
    Ok(Json(json!({ "maintenance": maintenance })))
}

pub(crate) async fn update_maintenance(
    _admin: Admin,
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<Maintenance>> {
    let request: UpdateMaintenanceRequest = json_body(&body)?;
    let maintenance = state
        .services
        .maintenance
        .update_status(request, Utc::now())
        .await?;
    Ok(Json(maintenance))
}

pub(crate) async fn delete_maintenance(
    _admin: Admin,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<Value>> {
    state.services.maintenance.delete(query.id.as_deref()).await?;
    Ok(deleted())
}
