use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use chrono::Utc;
use tracing::{debug, warn};

use crate::util::error::{HandlerError, HandlerErrorKind};
use crate::util::jwt::JwtTokenUtils;
use crate::util::session::{SessionGate, SessionState};

pub struct AdminAuthState {
    pub jwt_utils: Arc<dyn JwtTokenUtils>,
    pub gate: SessionGate,
}

/// Lets a request through only with a fresh admin access token. The
/// verified claims are attached to the request extensions.
pub async fn admin_auth(
    State(state): State<Arc<AdminAuthState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, HandlerError> {
    let claims = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|header| state.jwt_utils.extract_token_from_header(header).ok())
        .and_then(|token| match state.jwt_utils.validate_access_token(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!("Rejected access token: {}", e);
                None
            }
        });

    match state.gate.evaluate(claims, Utc::now().timestamp()) {
        SessionState::Authenticated(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        SessionState::Unauthenticated => Err(HandlerError::new(
            HandlerErrorKind::Unauthorized,
            "Authentication required",
        )),
        SessionState::Expired => {
            warn!("Admin session expired");
            Err(HandlerError::new(
                HandlerErrorKind::Unauthorized,
                "Session expired, please log in again",
            ))
        }
        SessionState::Forbidden => Err(HandlerError::new(
            HandlerErrorKind::Forbidden,
            "Admin access required",
        )),
    }
}
