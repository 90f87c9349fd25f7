use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::util::error::{HandlerError, HandlerErrorKind};
use crate::util::rate_limiter::{Endpoint, RateDecision, RateLimiter};

pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
    pub endpoint: Endpoint,
}

/// Counts the request against the caller's budget before the body is
/// read, so over-limit requests are rejected whatever they contain.
pub async fn rate_limit(
    State(state): State<Arc<RateLimitState>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, HandlerError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = state.limiter.client_for(req.headers(), peer);

    match state.limiter.check(state.endpoint, &client).await {
        RateDecision::Allowed { .. } => Ok(next.run(req).await),
        RateDecision::Limited { retry_after } => Err(HandlerError {
            retry_after: Some(retry_after),
            ..HandlerError::new(HandlerErrorKind::TooManyRequests, state.endpoint.limit_message())
        }),
    }
}
