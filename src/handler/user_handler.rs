use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::dto::lead_dto::ApiResponse;
use crate::dto::validation::to_field_errors;
use crate::handler::json_body;
use crate::service::user_service::{UserAuthResponse, UserService};
use crate::util::error::{HandlerError, HandlerErrorKind};
use crate::util::jwt::TokenPair;

pub struct UserHandlerState {
    pub service: Arc<dyn UserService>,
    pub expose_details: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 128, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 10, message = "Refresh token is required"))]
    pub refresh_token: String,
}

fn validated<T: Validate>(payload: T, field_order: &[&str]) -> Result<T, HandlerError> {
    payload.validate().map_err(|errors| HandlerError {
        errors: to_field_errors(&errors, field_order),
        ..HandlerError::new(HandlerErrorKind::Validation, "Validation failed")
    })?;
    Ok(payload)
}

pub async fn login_handler(
    State(state): State<Arc<UserHandlerState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<UserAuthResponse>>, HandlerError> {
    let payload = validated(json_body(body)?, &["email", "password"])?;
    let auth = state
        .service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| HandlerError::from_service(e, "Login failed", state.expose_details))?;
    Ok(Json(ApiResponse::with_message("Login successful", auth)))
}

pub async fn refresh_token_handler(
    State(state): State<Arc<UserHandlerState>>,
    body: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TokenPair>>, HandlerError> {
    let payload = validated(json_body(body)?, &["refreshToken"])?;
    let tokens = state
        .service
        .refresh_token(&payload.refresh_token)
        .await
        .map_err(|e| HandlerError::from_service(e, "Token refresh failed", state.expose_details))?;
    Ok(Json(ApiResponse::ok(tokens)))
}
