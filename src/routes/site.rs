/**
 * Site Routes
 * Static single-page app served behind the maintenance gate
 */
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

use crate::content::schema::MaintenanceRecord;
use crate::error::ApiError;
use crate::gate::{self, SiteState, BYPASS_COOKIE};
use crate::state::AppState;

/// Serve `dir`, answering unknown paths with its `index.html` so client-side
/// routes resolve.
pub fn static_service(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}

/// Fallback when no static site is configured.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Replace every gated page with the maintenance view while maintenance applies.
pub async fn maintenance_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if gate::is_ungated_path(request.uri().path()) {
        return next.run(request).await;
    }

    let bypassed = jar
        .get(BYPASS_COOKIE)
        .is_some_and(|cookie| state.verifier.is_bypass_marker(cookie.value()));

    let record = match state.maintenance_record().await {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "maintenance record unavailable, serving site");
            return next.run(request).await;
        }
    };

    let now = Utc::now();
    match gate::evaluate(&record, now, bypassed) {
        SiteState::Online => next.run(request).await,
        SiteState::Maintenance => {
            tracing::debug!(path = %request.uri().path(), "serving maintenance page");
            (StatusCode::SERVICE_UNAVAILABLE, Html(render_maintenance(&record, now))).into_response()
        }
    }
}

/// "2h 05m" style countdown; minutes round up so the page never shows 0m early.
fn format_remaining(left: chrono::Duration) -> String {
    let minutes = (left.num_seconds() + 59) / 60;
    let (days, hours, mins) = (minutes / 1440, (minutes % 1440) / 60, minutes % 60);
    if days > 0 {
        format!("{days}d {hours}h {mins:02}m")
    } else if hours > 0 {
        format!("{hours}h {mins:02}m")
    } else {
        format!("{mins}m")
    }
}

fn render_maintenance(record: &MaintenanceRecord, now: DateTime<Utc>) -> String {
    let message = ammonia::clean_text(&record.message);
    let estimated = ammonia::clean_text(&record.estimated_time);

    let countdown = record
        .remaining(now)
        .map(|left| format!("<p>Back in about {}</p>\n", format_remaining(left)))
        .unwrap_or_default();
    let contact = record
        .contact_email
        .as_deref()
        .filter(|email| !email.trim().is_empty())
        .map(|email| {
            let email = ammonia::clean_text(email.trim());
            format!("<p>Questions? <a href=\"mailto:{email}\">{email}</a></p>\n")
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Under Maintenance</title>
</head>
<body>
<main>
<h1>Under Maintenance</h1>
<p>{message}</p>
<p>Estimated time: {estimated}</p>
{countdown}{contact}</main>
</body>
</html>
"#
    )
}
