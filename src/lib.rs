//! Portfolio API - content and maintenance-mode service for a portfolio site

pub mod auth;
pub mod client;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod gate;
pub mod logging;
pub mod routes;
pub mod state;
pub mod store;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::{io, net::SocketAddr, path::Path, sync::Arc};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::auth::TokenVerifier;
use crate::config::ServerConfig;
use crate::state::AppState;
use crate::store::{ContentStore, MemoryContentStore, PgContentStore};

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];
const ALLOWED_HEADERS: [header::HeaderName; 2] = [header::CONTENT_TYPE, header::AUTHORIZATION];

/// Any origin, no credentials. Preflights of any path are answered here with an empty 200.
pub fn configure_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(ALLOWED_HEADERS)
}

/// `CorsLayer` only lists methods and headers on preflights; every other
/// response gets the same lists here.
fn cors_allow_lists() -> (
    SetResponseHeaderLayer<HeaderValue>,
    SetResponseHeaderLayer<HeaderValue>,
) {
    (
        SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
        ),
        SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("content-type, authorization"),
        ),
    )
}

/// Create and configure the application router.
pub fn create_app(state: AppState, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route(
            "/api/content",
            get(routes::content::get_content)
                .post(routes::content::create_content)
                .put(routes::content::update_content)
                .delete(routes::content::delete_content)
                .fallback(routes::method_not_allowed),
        )
        .route(
            "/api/maintenance",
            get(routes::maintenance::get_maintenance)
                .post(routes::maintenance::update_maintenance)
                .put(routes::maintenance::update_maintenance)
                .fallback(routes::method_not_allowed),
        )
        .route("/api/maintenance/bypass", post(routes::maintenance::admin_bypass))
        .route("/api/logs", post(routes::logs::receive_client_logs))
        .route("/health", get(routes::health::health_ping))
        .route("/health/ready", get(routes::health::health_ready));

    let router = match static_dir {
        Some(dir) => {
            tracing::info!("Serving static site from {}", dir.display());
            router.fallback_service(routes::site::static_service(dir))
        }
        None => router.fallback(routes::site::not_found),
    };

    let (allow_methods, allow_headers) = cors_allow_lists();

    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::site::maintenance_guard,
        ))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Global 2 MB request body cap
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(allow_methods)
        .layer(allow_headers)
        .layer(configure_cors())
        .with_state(state)
}

/// PostgreSQL when DATABASE_URL is set and reachable, otherwise the in-memory store.
async fn build_store(config: &ServerConfig) -> Arc<dyn ContentStore> {
    if config.database_url.is_none() {
        tracing::info!("DATABASE_URL not set. Content is kept in memory and lost on restart.");
        return Arc::new(MemoryContentStore::new());
    }

    let pool = match db::init_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(
                "Failed to initialize database pool: {}. Falling back to in-memory content.",
                e
            );
            return Arc::new(MemoryContentStore::new());
        }
    };

    if let Err(e) = db::run_migrations(&pool).await {
        tracing::error!(
            "Failed to run database migrations: {}. Falling back to in-memory content.",
            e
        );
        return Arc::new(MemoryContentStore::new());
    }

    let store = PgContentStore::new(pool);
    if let Err(e) = store.seed_defaults().await {
        tracing::error!("Failed to seed default content: {}", e);
    }
    Arc::new(store)
}

/// Run the server (used by main).
pub async fn run() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let environment =
        std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    // Dropping the guards shuts down the background log writers.
    let _log_guards = logging::init(&environment);

    routes::health::init_start_time();

    let config = ServerConfig::from_env();
    let verifier = TokenVerifier::new(config.maintenance_token.clone());
    if !verifier.is_configured() {
        tracing::warn!(
            "SECURITY: neither MAINTENANCE_TOKEN nor MAINTENANCE_TOKEN_HASH is set. \
             Every maintenance write will be rejected."
        );
    } else if config.is_production() && std::env::var("MAINTENANCE_TOKEN_HASH").is_err() {
        tracing::warn!(
            "SECURITY: MAINTENANCE_TOKEN is set in plain text. \
             Prefer MAINTENANCE_TOKEN_HASH (see the hash-token binary)."
        );
    }

    let store = build_store(&config).await;
    let state = AppState::new(store, verifier);
    let app = create_app(state, config.static_dir.as_deref());

    let addr = config
        .bind_addr()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Mutation, Section};
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const TOKEN: &str = "app-token";

    fn test_state() -> AppState {
        AppState::in_memory(TokenVerifier::from_plain(TOKEN))
    }

    async fn send(app: &Router, req: axum::http::Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_options_anywhere_is_empty_ok_with_cors() {
        let app = create_app(test_state(), None);
        for uri in [
            "/api/content",
            "/api/content?section=projects&id=1",
            "/api/content?section=nonsense",
            "/api/maintenance",
            "/anything/else",
        ] {
            let req = axum::http::Request::builder()
                .method(Method::OPTIONS)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let (status, headers, body) = send(&app, req).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert!(body.is_empty(), "{uri}");
            assert_eq!(
                headers
                    .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                    .and_then(|v| v.to_str().ok()),
                Some("*"),
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_preflight_lists_allowed_methods() {
        let app = create_app(test_state(), None);
        let req = axum::http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/content?section=hero")
            .header(header::ORIGIN, "https://portfolio.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        let methods = headers
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(methods.contains("PUT"));
        assert!(methods.contains("DELETE"));
    }

    #[tokio::test]
    async fn test_api_responses_carry_cors_and_request_id() {
        let app = create_app(test_state(), None);
        let req = axum::http::Request::get("/api/content")
            .header(header::ORIGIN, "https://portfolio.example")
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_some());
        assert!(headers.get("x-request-id").is_some());
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], true);
        assert!(body["data"]["projects"].is_array());
    }

    #[tokio::test]
    async fn test_error_responses_carry_cors_allow_lists() {
        let app = create_app(test_state(), None);
        let not_found = axum::http::Request::get("/api/content?section=nope")
            .header(header::ORIGIN, "https://portfolio.example")
            .body(Body::empty())
            .unwrap();
        let unauthorized = axum::http::Request::put("/api/maintenance")
            .header(header::ORIGIN, "https://portfolio.example")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"isGloballyActive":true}"#))
            .unwrap();

        for (req, expected) in [
            (not_found, StatusCode::NOT_FOUND),
            (unauthorized, StatusCode::UNAUTHORIZED),
        ] {
            let (status, headers, _) = send(&app, req).await;
            assert_eq!(status, expected);
            assert_eq!(
                headers
                    .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                    .and_then(|v| v.to_str().ok()),
                Some("*")
            );
            let methods = headers
                .get(header::ACCESS_CONTROL_ALLOW_METHODS)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            assert_eq!(methods, "GET, POST, PUT, DELETE, OPTIONS");
            let allowed = headers
                .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            assert!(allowed.contains("authorization"));
            assert!(allowed.contains("content-type"));
        }
    }

    #[tokio::test]
    async fn test_unsupported_method_is_405() {
        let app = create_app(test_state(), None);
        let req = axum::http::Request::builder()
            .method(Method::PATCH)
            .uri("/api/content?section=hero")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_unknown_route_without_static_site_is_json_404() {
        let app = create_app(test_state(), None);
        let req = axum::http::Request::get("/nope").body(Body::empty()).unwrap();
        let (status, _, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_gate_spares_admin_and_api_during_maintenance() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>portfolio</p>").unwrap();
        let state = test_state();
        state
            .store
            .mutate(
                Section::Maintenance,
                Mutation::Merge(json!({ "isGloballyActive": true }).as_object().cloned().unwrap()),
            )
            .await
            .unwrap();
        let app = create_app(state, Some(dir.path()));

        let get = |uri: &str| axum::http::Request::get(uri).body(Body::empty()).unwrap();

        let (status, _, _) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _, body) = send(&app, get("/admin")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("portfolio"));

        let (status, _, body) = send(&app, get("/api/maintenance")).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["data"]["isGloballyActive"], true);

        let (status, _, _) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bypass_flow_reaches_site() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>portfolio</p>").unwrap();
        let state = test_state();
        let app = create_app(state, Some(dir.path()));

        let req = axum::http::Request::put("/api/maintenance")
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"isGloballyActive":true}"#))
            .unwrap();
        let (status, _, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);

        let req = axum::http::Request::post("/api/maintenance/bypass")
            .header(header::AUTHORIZATION, TOKEN)
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        let set_cookie = headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let req = axum::http::Request::get("/")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
    }
}
