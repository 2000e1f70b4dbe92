use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use serde::de::DeserializeOwned;

use vigil_application::AdminIdentity;
use vigil_domain::VigilError;

use crate::AppState;
use crate::error::ApiError;

/// Bearer token from the `Authorization` header, if any.
pub(crate) async fn bearer_token(parts: &mut Parts, state: &AppState) -> Option<String> {
    TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
        .await
        .ok()
        .map(|TypedHeader(auth)| auth.token().to_string())
}

/// Rejects the request with 401 unless it carries an admin token.
pub struct Admin(pub AdminIdentity);

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await;
        Ok(Admin(state.services.authorizer.admin(token.as_deref())?))
    }
}

/// Passes when the request carries the cron secret, or none is configured.
pub struct CronCaller;

impl FromRequestParts<AppState> for CronCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await;
        state.services.authorizer.cron(token.as_deref())?;
        Ok(CronCaller)
    }
}

/// Parse a JSON body, reporting malformed input as a 400.
pub(crate) fn json_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|_| ApiError(VigilError::validation("Invalid JSON body")))
}
