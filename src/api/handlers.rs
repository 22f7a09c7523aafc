use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::{
    error::{AppError, AppResult},
    middleware::session_id::SessionId,
    models::UserContext,
    services::RecommendationPage,
};

// Request types

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub page_token: Option<String>,
    pub count: Option<usize>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Next page of the session's recommendation stream
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    headers: HeaderMap,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationPage>> {
    let user = user_from_headers(&headers)?;
    let count = query.count.unwrap_or(state.limits.default_batch_size);
    if count == 0 || count > state.limits.max_batch_size {
        return Err(AppError::InvalidInput(format!(
            "count must be between 1 and {}",
            state.limits.max_batch_size
        )));
    }

    tracing::info!(
        session_id = %session_id,
        count,
        has_token = query.page_token.is_some(),
        "Processing recommendation request"
    );

    let page = state
        .recommendations
        .next_page(session_id.as_str(), &user, query.page_token.as_deref(), count)
        .await?;

    Ok(Json(page))
}

/// Restart the session's recommendation stream
pub async fn reset_session(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> AppResult<StatusCode> {
    state.recommendations.reset(session_id.as_str()).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn user_from_headers(headers: &HeaderMap) -> AppResult<UserContext> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    Ok(UserContext {
        access_token: token.to_string(),
    })
}
