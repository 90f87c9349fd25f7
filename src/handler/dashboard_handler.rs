use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::error;

use crate::dto::lead_dto::ApiResponse;
use crate::service::dashboard::{Dashboard, DashboardService};
use crate::util::error::HandlerError;

pub struct DashboardState {
    pub service: Arc<DashboardService>,
    pub expose_details: bool,
}

pub async fn dashboard_handler(
    State(state): State<Arc<DashboardState>>,
) -> Result<Json<ApiResponse<Dashboard>>, HandlerError> {
    let dashboard = state.service.dashboard().await.map_err(|e| {
        error!("Failed to build dashboard: {}", e);
        HandlerError::from_service(e, "Failed to load dashboard", state.expose_details)
    })?;
    Ok(Json(ApiResponse::ok(dashboard)))
}
