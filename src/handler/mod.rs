pub mod dashboard_handler;
pub mod health_handler;
pub mod lead_handler;
pub mod user_handler;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::util::error::{HandlerError, HandlerErrorKind};

/// Unwrap a JSON body, turning axum's rejection into the uniform error shape.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, HandlerError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        HandlerError::new(HandlerErrorKind::BadRequest, "Invalid JSON body").with_details(rejection.body_text())
    })
}
