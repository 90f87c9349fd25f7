use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handler::dashboard_handler::{dashboard_handler, DashboardState};
use crate::handler::user_handler::{login_handler, refresh_token_handler, UserHandlerState};
use crate::middlewares::admin_middleware::{admin_auth, AdminAuthState};

pub fn admin_router(
    user_state: Arc<UserHandlerState>,
    dashboard_state: Arc<DashboardState>,
    admin_auth_state: Arc<AdminAuthState>,
) -> Router {
    let public = Router::new()
        .route("/api/admin/login", post(login_handler))
        .route("/api/admin/refresh-token", post(refresh_token_handler))
        .with_state(user_state);

    let admin = Router::new()
        .route("/api/admin/dashboard", get(dashboard_handler))
        .route_layer(middleware::from_fn_with_state(admin_auth_state, admin_auth))
        .with_state(dashboard_state);

    public.merge(admin)
}
