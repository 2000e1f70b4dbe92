use axum::Json;
use axum::extract::{Query, State};
use axum::response::Redirect;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::error;

use vigil_application::VerifyOutcome;
use vigil_domain::{SubscribeRequest, TokenRequest, VigilError};

use crate::AppState;
use crate::error::ApiResult;
use crate::extract::json_body;

const SUBSCRIBE_PAGE: &str = "/subscribe";

fn page_status(status: &str) -> Redirect {
    Redirect::temporary(&format!("{SUBSCRIBE_PAGE}?status={status}"))
}

fn page_error(code: &str) -> Redirect {
    Redirect::temporary(&format!("{SUBSCRIBE_PAGE}?error={code}"))
}

pub(crate) async fn subscribe(State(state): State<AppState>, body: String) -> ApiResult<Json<Value>> {
    let request: SubscribeRequest = json_body(&body)?;
    let outcome = state
        .services
        .subscriptions
        .subscribe(request, Utc::now())
        .await?;
    Ok(Json(json!({ "message": outcome.message() })))
}

pub(crate) async fn verify(State(state): State<AppState>, body: String) -> ApiResult<Json<Value>> {
    let request: TokenRequest = json_body(&body)?;
    let outcome = state
        .services
        .subscriptions
        .verify(request.token.as_deref(), Utc::now())
        .await?;
    let message = match outcome {
        VerifyOutcome::Verified => "Subscription verified",
        VerifyOutcome::AlreadyVerified => "Subscription already verified",
    };
    Ok(Json(json!({ "message": message, "status": outcome.as_str() })))
}

/// Link target from the verification email.
pub(crate) async fn verify_link(
    State(state): State<AppState>,
    Query(query): Query<TokenRequest>,
) -> Redirect {
    match state
        .services
        .subscriptions
        .verify(query.token.as_deref(), Utc::now())
        .await
    {
        Ok(outcome) => page_status(outcome.as_str()),
        Err(VigilError::Internal(e)) => {
            error!("verification failed: {e:#}");
            page_error("server_error")
        }
        Err(_) => page_error("invalid_token"),
    }
}

pub(crate) async fn unsubscribe(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<Value>> {
    let request: TokenRequest = json_body(&body)?;
    state
        .services
        .subscriptions
        .unsubscribe(request.token.as_deref())
        .await?;
    Ok(Json(json!({ "message": "Successfully unsubscribed" })))
}

/// Link target from the footer of every notification email.
pub(crate) async fn unsubscribe_link(
    State(state): State<AppState>,
    Query(query): Query<TokenRequest>,
) -> Redirect {
    match state
        .services
        .subscriptions
        .unsubscribe(query.token.as_deref())
        .await
    {
        Ok(()) => page_status("unsubscribed"),
        Err(VigilError::NotFound(_)) => page_error("not_found"),
        Err(VigilError::Internal(e)) => {
            error!("unsubscribe failed: {e:#}");
            page_error("server_error")
        }
        Err(_) => page_error("invalid_token"),
    }
}
