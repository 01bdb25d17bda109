/**
 * Maintenance Routes
 * Read and update the site-wide maintenance record
 */
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde_json::{json, Value};

use crate::content::{
    into_object,
    schema::{MaintenancePatch, MaintenanceRecord},
    ContentError, Mutation, Section,
};
use crate::error::ApiError;
use crate::gate::BYPASS_COOKIE;
use crate::routes::{parse_body, ApiResponse};
use crate::state::AppState;

/// Merge a partial update into the record and stamp `lastUpdated`.
/// Callers are responsible for checking credentials first.
pub(crate) async fn write_record(state: &AppState, body: Value) -> Result<MaintenanceRecord, ApiError> {
    let mut patch = into_object(body)?;

    // Shape check on the patch alone, so `lastUpdated` and unknown keys are refused.
    serde_json::from_value::<MaintenancePatch>(Value::Object(patch.clone()))
        .map_err(|e| ApiError::BadRequest(format!("Invalid maintenance update: {e}")))?;

    patch.insert("lastUpdated".to_string(), json!(Utc::now()));

    let value = state
        .store
        .mutate(Section::Maintenance, Mutation::Merge(patch))
        .await?
        .ok_or(ContentError::Corrupt(Section::Maintenance))?;

    serde_json::from_value(value).map_err(|_| ContentError::Corrupt(Section::Maintenance).into())
}

/// GET /api/maintenance
pub async fn get_maintenance(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, ApiError> {
    Ok(Json(ApiResponse::data(state.maintenance_record().await?)))
}

/// POST|PUT /api/maintenance - requires the pre-shared token
pub async fn update_maintenance(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<MaintenanceRecord>>, ApiError> {
    if let Err(e) = state.verifier.authorize(&headers).await {
        tracing::warn!("Rejected maintenance update: missing or invalid credential");
        return Err(e);
    }

    let record = write_record(&state, parse_body(&body)?).await?;

    tracing::info!(
        active = record.is_globally_active,
        message = %record.message,
        "maintenance mode updated"
    );

    Ok(Json(ApiResponse::with_message(
        record,
        "Maintenance configuration updated successfully",
    )))
}

/// POST /api/maintenance/bypass - marks this browser session as the admin
pub async fn admin_bypass(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse>), ApiError> {
    state.verifier.authorize(&headers).await?;
    let marker = state
        .verifier
        .bypass_marker()
        .ok_or(ApiError::Unauthorized)?;

    // No expiry: the cookie lives as long as the browser session.
    let cookie = Cookie::build((BYPASS_COOKIE, marker))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    tracing::info!("Admin maintenance bypass enabled for session");

    Ok((
        jar.add(cookie),
        Json(ApiResponse::message("Maintenance bypass enabled for this session")),
    ))
}
