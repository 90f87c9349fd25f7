use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_NAME: &str = "bcm-backend";

/// Installs the global subscriber. Keep the value alive for the whole
/// process: dropping it stops the file writers.
pub struct Logger {
    pub guards: Vec<WorkerGuard>,
}

fn daily_writer(dir: &Path, file_name: String, guards: &mut Vec<WorkerGuard>) -> NonBlocking {
    let (writer, guard) = non_blocking(rolling::daily(dir, file_name));
    guards.push(guard);
    writer
}

impl Logger {
    /// Console output is filtered by RUST_LOG (default debug). Files go to
    /// LOG_DIR (default `logs`): plain and JSON, general and error-only,
    /// rotated daily. FILE_LOG_LEVEL and ERROR_FILE_LOG_LEVEL set their
    /// filters.
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        let base = Path::new(&log_dir);
        std::fs::create_dir_all(base.join("error").join("json"))?;
        std::fs::create_dir_all(base.join("json"))?;

        let console_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("debug,bcm_backend=debug,hyper=info,mongodb=info"));
        let file_log_level = std::env::var("FILE_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());
        let error_file_log_level = std::env::var("ERROR_FILE_LOG_LEVEL").unwrap_or_else(|_| "error".to_string());

        let mut guards = Vec::with_capacity(4);
        let general = daily_writer(base, format!("{}.log", LOG_NAME), &mut guards);
        let errors = daily_writer(&base.join("error"), format!("{}-error.log", LOG_NAME), &mut guards);
        let general_json = daily_writer(&base.join("json"), format!("{}.json", LOG_NAME), &mut guards);
        let errors_json = daily_writer(&base.join("error").join("json"), format!("{}-error.json", LOG_NAME), &mut guards);

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(true)
                    .with_filter(console_filter),
            )
            .with(
                fmt::layer()
                    .with_writer(general)
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&file_log_level)),
            )
            .with(
                fmt::layer()
                    .with_writer(errors)
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&error_file_log_level)),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(general_json)
                    .with_filter(EnvFilter::new(&file_log_level)),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(errors_json)
                    .with_filter(EnvFilter::new(&error_file_log_level)),
            )
            .try_init()?;

        Ok(Logger { guards })
    }
}
