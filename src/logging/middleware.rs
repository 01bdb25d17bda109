use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::time::Instant;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

use super::config::LogLevel;

/// Level a completed request is logged at. Successful health checks log at
/// debug; 503 (maintenance page, store not ready) logs as a warning.
fn completion_level(path: &str, status: StatusCode) -> LogLevel {
    if status == StatusCode::SERVICE_UNAVAILABLE || status.is_client_error() {
        LogLevel::Warn
    } else if status.is_server_error() {
        LogLevel::Error
    } else if path.starts_with("/health") {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let req_id: String = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        request_id = %req_id,
        method = %method,
        uri = %uri,
        version = ?request.version(),
        "incoming request"
    );

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status();

    macro_rules! completed {
        ($level:ident, $msg:literal) => {
            tracing::$level!(
                request_id = %req_id,
                method = %method,
                uri = %uri,
                status = %status,
                duration_ms = %duration_ms,
                $msg
            )
        };
    }

    match completion_level(uri.path(), status) {
        LogLevel::Error => completed!(error, "request completed with error"),
        LogLevel::Warn => completed!(warn, "request completed with client error or unavailable"),
        LogLevel::Info => completed!(info, "request completed successfully"),
        LogLevel::Debug | LogLevel::Trace => completed!(debug, "request completed successfully"),
    }

    response
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_level_by_status_class() {
        assert_eq!(completion_level("/api/content", StatusCode::OK), LogLevel::Info);
        assert_eq!(completion_level("/api/content", StatusCode::NOT_FOUND), LogLevel::Warn);
        assert_eq!(
            completion_level("/api/content", StatusCode::INTERNAL_SERVER_ERROR),
            LogLevel::Error
        );
    }

    #[test]
    fn test_health_checks_log_at_debug() {
        assert_eq!(completion_level("/health/ready", StatusCode::OK), LogLevel::Debug);
        assert_eq!(
            completion_level("/health/ready", StatusCode::SERVICE_UNAVAILABLE),
            LogLevel::Warn
        );
    }
}
