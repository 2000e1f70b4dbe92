use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use vigil_application::status::MAX_HISTORY_DAYS;
use vigil_application::{HistoryReport, IncidentPage, StatusOverview};
use vigil_domain::{ComponentType, Incident, IncidentFilter, MaintenanceFilter, VigilError};

use crate::AppState;
use crate::error::ApiResult;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryQuery {
    component: Option<String>,
    days: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    status: Option<String>,
    limit: Option<String>,
    page: Option<String>,
}

/// Lenient numeric query values: anything unparsable counts as absent.
fn number<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|raw| raw.trim().parse().ok())
}

pub(crate) async fn status(State(state): State<AppState>) -> ApiResult<Json<StatusOverview>> {
    Ok(Json(state.services.status.overview(Utc::now()).await?))
}

pub(crate) async fn components(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let now = Utc::now();
    let components = state.services.status.component_details(now).await?;
    Ok(Json(json!({ "components": components, "updatedAt": now })))
}

pub(crate) async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryReport>> {
    let component = match query.component.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<ComponentType>()
                .map_err(|_| VigilError::validation("Invalid component"))?,
        ),
    };
    let days = number(query.days.as_deref()).unwrap_or(MAX_HISTORY_DAYS);
    let report = state
        .services
        .status
        .history(component, days, Utc::now())
        .await?;
    Ok(Json(report))
}

pub(crate) async fn incidents(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<IncidentPage>> {
    let filter = IncidentFilter::from_query(query.status.as_deref());
    let page = state
        .services
        .incidents
        .list(
            filter,
            number(query.page.as_deref()),
            number(query.limit.as_deref()),
        )
        .await?;
    Ok(Json(page))
}

pub(crate) async fn incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Incident>> {
    Ok(Json(state.services.incidents.get(&id).await?))
}

pub(crate) async fn maintenance(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    let filter = MaintenanceFilter::from_query(query.status.as_deref());
    let maintenance = state
        .services
        .maintenance
        .list(filter, Utc::now())
        .await?;
    Ok(Json(json!({ "maintenance": maintenance })))
}
