/**
 * Logs Route Handler
 * Diagnostics reported by the portfolio client
 */

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use tower_http::request_id::RequestId;

use crate::error::ApiError;
use crate::logging::config::{ClientLogBatch, ClientLogEntry, LogLevel, LogResponse};

const MAX_BATCH: usize = 100;
const MAX_MESSAGE_LEN: usize = 2_000;

/// POST /api/logs - Receive client logs
#[tracing::instrument(skip(logs), fields(batch_size = logs.logs.len()))]
pub async fn receive_client_logs(
    request_id: Option<Extension<RequestId>>,
    WithRejection(Json(logs), _): WithRejection<Json<ClientLogBatch>, ApiError>,
) -> Result<(StatusCode, Json<LogResponse>), ApiError> {
    if logs.logs.len() > MAX_BATCH {
        return Err(ApiError::BadRequest(format!(
            "At most {MAX_BATCH} log entries per batch"
        )));
    }

    let req_id = request_id
        .as_ref()
        .and_then(|ext| ext.0.header_value().to_str().ok())
        .unwrap_or("unknown");

    let mut processed = 0;

    for log in &logs.logs {
        if let Err(e) = process_client_log(log, req_id) {
            tracing::warn!(
                request_id = %req_id,
                error = %e,
                "failed to process client log"
            );
        } else {
            processed += 1;
        }
    }

    tracing::debug!(
        request_id = %req_id,
        received = logs.logs.len(),
        processed,
        "received client logs"
    );

    let response = LogResponse {
        success: true,
        received: logs.logs.len(),
        processed,
    };

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Re-emit one client entry inside a `client_log` span.
fn process_client_log(log: &ClientLogEntry, request_id: &str) -> Result<(), &'static str> {
    if log.message.trim().is_empty() {
        return Err("empty message");
    }
    if log.message.len() > MAX_MESSAGE_LEN {
        return Err("message too long");
    }

    let span = tracing::info_span!(
        "client_log",
        request_id = %request_id,
        timestamp = %log.timestamp,
        source = log.source.as_deref().unwrap_or("client"),
    );
    let _enter = span.enter();

    match log.level {
        LogLevel::Trace => tracing::trace!(message = %log.message, context = ?log.context, "client log"),
        LogLevel::Debug => tracing::debug!(message = %log.message, context = ?log.context, "client log"),
        LogLevel::Info => tracing::info!(message = %log.message, context = ?log.context, "client log"),
        LogLevel::Warn => tracing::warn!(message = %log.message, context = ?log.context, "client log"),
        LogLevel::Error => tracing::error!(message = %log.message, context = ?log.context, "client log"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::routing::post;
    use axum::Router;
    use serde_json::json;
    use tower::ServiceExt;

    fn logs_router() -> Router {
        Router::new().route("/api/logs", post(receive_client_logs))
    }

    async fn send(body: serde_json::Value) -> (StatusCode, Option<LogResponse>) {
        let req = Request::post("/api/logs")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = logs_router().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).ok())
    }

    #[tokio::test]
    async fn test_batch_is_accepted_and_counted() {
        let (status, body) = send(json!({
            "logs": [
                { "timestamp": "2024-01-01T00:00:00Z", "level": "info", "message": "loaded" },
                { "timestamp": "2024-01-01T00:00:01Z", "level": "error", "message": "save failed",
                  "source": "admin/projects", "context": { "section": "projects" } },
                { "timestamp": "2024-01-01T00:00:02Z", "level": "warn", "message": "  " }
            ]
        }))
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let body = body.unwrap();
        assert_eq!(body.received, 3);
        assert_eq!(body.processed, 2);
    }

    async fn send_raw(body: &str) -> (StatusCode, Option<String>, serde_json::Value) {
        let req = Request::post("/api/logs")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = logs_router().oneshot(req).await.unwrap();
        let status = res.status();
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_unknown_level_is_rejected_with_json_envelope() {
        let (status, content_type, body) =
            send_raw(r#"{"logs":[{"timestamp":"t","level":"fatal","message":"x"}]}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_bad_request() {
        let (status, content_type, body) = send_raw("{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_oversized_batch_is_bad_request() {
        let entry = json!({ "timestamp": "t", "level": "debug", "message": "x" });
        let logs = vec![entry; MAX_BATCH + 1];
        let (status, _) = send(json!({ "logs": logs })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
