/*!
 * Logging Module
 * Subscriber setup for the API server
 */
pub mod config;
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

const LOG_DIR: &str = "logs";

/// Directive used when `RUST_LOG` is unset. `LOG_LEVEL` only sets this crate's level.
fn default_filter(is_production: bool, log_level: Option<&str>) -> String {
    let level = log_level.unwrap_or(if is_production { "info" } else { "debug" });
    format!("portfolio_api={level},tower_http=debug,axum=debug")
}

/// Install the global subscriber: `logs/app.log` and `logs/error.log` roll daily,
/// the console gets everything. Production writes JSON.
///
/// The returned guards flush the background writers on drop and must be held
/// for the lifetime of the process.
pub fn init(environment: &str) -> Vec<WorkerGuard> {
    let is_production = environment == "production";

    if let Err(e) = std::fs::create_dir_all(LOG_DIR) {
        eprintln!("cannot create {LOG_DIR}/: {e}");
    }

    let (file_writer, file_guard) = non_blocking(rolling::daily(LOG_DIR, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(LOG_DIR, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let log_level = std::env::var("LOG_LEVEL").ok();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(is_production, log_level.as_deref())));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if is_production {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let error_layer = fmt::layer()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_filter(LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    }

    tracing::info!(environment, "logging initialized");

    vec![file_guard, error_guard, console_guard]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_levels() {
        assert_eq!(
            default_filter(true, None),
            "portfolio_api=info,tower_http=debug,axum=debug"
        );
        assert!(default_filter(false, None).starts_with("portfolio_api=debug,"));
        assert!(default_filter(true, Some("trace")).starts_with("portfolio_api=trace,"));
    }

    #[test]
    fn test_default_filter_parses() {
        for production in [true, false] {
            assert!(EnvFilter::try_new(default_filter(production, None)).is_ok());
        }
    }
}
