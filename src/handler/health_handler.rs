use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::config::AppEnvironment;
use crate::model::lead::timestamp;
use crate::repository::mongo::StoreHealth;

const PAGE_SIZE_BYTES: f64 = 4096.0;

pub struct HealthState {
    pub store: Arc<dyn StoreHealth>,
    pub environment: AppEnvironment,
    pub started: Instant,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub status: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub rss_mb: f64,
    pub virtual_mb: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since startup
    pub uptime: f64,
    pub environment: &'static str,
    pub database: DatabaseHealth,
    pub memory: Option<MemoryUsage>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse `/proc/self/statm`: total program size then resident set, in pages.
pub fn parse_statm(statm: &str) -> Option<MemoryUsage> {
    let mut fields = statm.split_whitespace().map(|v| v.parse::<f64>().ok());
    let virtual_pages = fields.next()??;
    let rss_pages = fields.next()??;
    let to_mb = |pages: f64| round2(pages * PAGE_SIZE_BYTES / 1024.0 / 1024.0);
    Some(MemoryUsage { rss_mb: to_mb(rss_pages), virtual_mb: to_mb(virtual_pages) })
}

fn memory_usage() -> Option<MemoryUsage> {
    std::fs::read_to_string("/proc/self/statm").ok().as_deref().and_then(parse_statm)
}

pub async fn health_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let database = match state.store.ping().await {
        Ok(()) => DatabaseHealth { status: "healthy", message: "Database connection is active", error: None },
        Err(e) => {
            warn!("Health check: database ping failed: {}", e);
            DatabaseHealth { status: "unhealthy", message: "Database connection failed", error: Some(e.to_string()) }
        }
    };
    let healthy = database.error.is_none();
    let report = HealthReport {
        status: if healthy { "healthy" } else { "unhealthy" },
        timestamp: timestamp(Utc::now()),
        uptime: round2(state.started.elapsed().as_secs_f64()),
        environment: state.environment.as_str(),
        database,
        memory: memory_usage(),
    };
    let code = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(report))
}

pub async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "message": "BCM Group Backend API is running!",
        "status": "healthy",
        "timestamp": timestamp(Utc::now()),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub const AVAILABLE_ROUTES: [&str; 12] = [
    "POST /api/enquiry/submit",
    "GET /api/enquiry/all",
    "GET /api/enquiry/{id}",
    "PUT /api/enquiry/{id}/status",
    "POST /api/contact/submit",
    "GET /api/contact/all",
    "GET /api/contact/{id}",
    "PUT /api/contact/{id}/status",
    "POST /api/admin/login",
    "POST /api/admin/refresh-token",
    "GET /api/admin/dashboard",
    "GET /health",
];

pub async fn not_found_handler(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": format!("Route {} not found", uri.path()),
            "availableRoutes": AVAILABLE_ROUTES,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statm() {
        let usage = parse_statm("51200 2560 700 300 0 9000 0\n").unwrap();
        assert_eq!(usage, MemoryUsage { rss_mb: 10.0, virtual_mb: 200.0 });
        assert_eq!(parse_statm(""), None);
        assert_eq!(parse_statm("abc 12"), None);
    }
}
