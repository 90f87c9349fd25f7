//! Admin session gate: decides whether a presented credential may enter a
//! protected view.

use chrono::Duration;

use crate::util::jwt::Claims;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No credential, or one that failed verification
    Unauthenticated,
    /// Valid credential whose login is older than the session limit. The
    /// client should drop every stored session marker.
    Expired,
    Forbidden,
    Authenticated(Claims),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionGate {
    max_age: Duration,
}

impl SessionGate {
    pub fn new(max_age_minutes: i64) -> Self {
        SessionGate { max_age: Duration::minutes(max_age_minutes) }
    }

    /// `claims` is None when the request carried no verifiable token.
    /// `now` is a unix timestamp in seconds.
    pub fn evaluate(&self, claims: Option<Claims>, now: i64) -> SessionState {
        let Some(claims) = claims else {
            return SessionState::Unauthenticated;
        };
        if now - claims.auth_time > self.max_age.num_seconds() {
            return SessionState::Expired;
        }
        if claims.role != ADMIN_ROLE {
            return SessionState::Forbidden;
        }
        SessionState::Authenticated(claims)
    }
}
