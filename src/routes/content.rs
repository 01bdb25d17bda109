/**
 * Content Routes
 * CRUD endpoints over the portfolio sections (hero, about, skills, projects, blog, ...)
 */
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::content::{find_item, into_object, schema::ContactSubmission, Mutation, Section};
use crate::error::ApiError;
use crate::routes::{maintenance, parse_body, ApiResponse};
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters shared by every /api/content method
#[derive(Debug, Default, Deserialize)]
pub struct ContentQuery {
    pub section: Option<String>,
    pub id: Option<String>,
}

impl ContentQuery {
    fn section(&self) -> Option<&str> {
        self.section.as_deref().filter(|s| !s.trim().is_empty())
    }

    fn id(&self) -> Result<Option<&str>, ApiError> {
        match self.id.as_deref().filter(|s| !s.is_empty()) {
            Some(id) if !is_valid_id(id) => Err(ApiError::BadRequest(
                "Invalid id: use letters, numbers, '-' or '_' (max 64)".to_string(),
            )),
            other => Ok(other),
        }
    }

    fn required_section(&self) -> Result<Section, ApiError> {
        let name = self
            .section()
            .ok_or_else(|| ApiError::BadRequest("Missing section parameter".to_string()))?;
        Ok(name.parse()?)
    }
}

// ============================================================================
// Validation
// ============================================================================

lazy_static::lazy_static! {
    /// Item ids: timestamps in practice, but any short token-like string is accepted
    static ref ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();
}

fn is_valid_id(id: &str) -> bool {
    ID_REGEX.is_match(id)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/content[?section=...[&id=...]]
/// Whole store, one section, or one item of `projects`/`blog`
pub async fn get_content(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ContentQuery>, ApiError>,
) -> Result<Json<ApiResponse>, ApiError> {
    if query.section().is_none() {
        let snapshot = state.store.snapshot().await?;
        return Ok(Json(ApiResponse::data(Value::Object(snapshot))));
    }

    let section = query.required_section()?;
    let id = query.id()?;
    let value = state.store.section(section).await?;

    match (section.collection(), id) {
        (Some(_), Some(id)) => find_item(section, &value, id)
            .cloned()
            .map(|item| Json(ApiResponse::data(item)))
            .ok_or_else(|| ApiError::NotFound(format!("No {section} item with id '{id}'"))),
        _ => Ok(Json(ApiResponse::data(value))),
    }
}

/// POST /api/content?section=...
/// Appends a project or blog post; contact submissions are logged, not stored
pub async fn create_content(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ContentQuery>, ApiError>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    let invalid = || ApiError::BadRequest("Invalid section for POST".to_string());
    let section: Section = query
        .section()
        .ok_or_else(|| ApiError::BadRequest("Missing section parameter".to_string()))?
        .parse()
        .map_err(|_| invalid())?;
    let body = parse_body(&body)?;

    if section == Section::Contact {
        let submission: ContactSubmission = serde_json::from_value(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid contact submission: {e}")))?;
        tracing::info!(
            name = %submission.name,
            email = %submission.email,
            subject = ?submission.subject,
            message_len = submission.message.len(),
            "contact form submission"
        );
        return Ok((
            StatusCode::CREATED,
            Json(ApiResponse::message("Contact submission received")),
        ));
    }

    if section.collection().is_none() {
        return Err(invalid());
    }

    let item = into_object(body)?;
    let created = state
        .store
        .mutate(section, Mutation::Insert { item, at: Utc::now() })
        .await?
        .ok_or_else(|| ApiError::Internal(format!("{section} insert returned no item")))?;

    tracing::info!(section = %section, id = ?created.get("id"), "content item created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            created,
            format!("{section} created successfully"),
        )),
    ))
}

/// PUT /api/content?section=...[&id=...]
/// Shallow-merges the body into one item, or into the whole section
pub async fn update_content(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ContentQuery>, ApiError>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse>, ApiError> {
    let section = query.required_section()?;
    let id = query.id()?;

    if section == Section::Maintenance {
        state.verifier.authorize(&headers).await?;
        let record = maintenance::write_record(&state, parse_body(&body)?).await?;
        let value = serde_json::to_value(record)
            .map_err(|e| ApiError::Internal(format!("failed to encode maintenance record: {e}")))?;
        return Ok(Json(ApiResponse::with_message(
            value,
            "maintenance updated successfully",
        )));
    }

    let body = parse_body(&body)?;
    let mutation = match (section.collection(), id) {
        (Some(_), Some(id)) => Mutation::MergeItem {
            id: id.to_string(),
            patch: into_object(body)?,
        },
        _ => Mutation::patch_section(section, body)?,
    };

    match state.store.mutate(section, mutation).await? {
        Some(value) => {
            tracing::info!(section = %section, id = ?id, "content updated");
            Ok(Json(ApiResponse::with_message(
                value,
                format!("{section} updated successfully"),
            )))
        }
        None => Ok(Json(ApiResponse::message(format!(
            "No {section} item with id '{}'; nothing updated",
            id.unwrap_or_default()
        )))),
    }
}

/// DELETE /api/content?section=...&id=...
/// Removes one item from `projects` or `blog`; anything else is a no-op
pub async fn delete_content(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ContentQuery>, ApiError>,
) -> Result<Json<ApiResponse>, ApiError> {
    let section = query.required_section()?;
    let id = query.id()?;

    let removed = match (section.collection(), id) {
        (Some(_), Some(id)) => {
            state
                .store
                .mutate(section, Mutation::RemoveItem { id: id.to_string() })
                .await?
        }
        _ => None,
    };

    Ok(Json(match removed {
        Some(item) => {
            tracing::info!(section = %section, id = ?id, "content item deleted");
            ApiResponse::with_message(item, format!("{section} deleted successfully"))
        }
        None => ApiResponse::message(format!("Nothing to delete in {section}")),
    }))
}
