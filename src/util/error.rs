use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::model::lead::InvalidStatus;

/// A single rejected input field, reported back to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError { field: field.into(), message: message.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandlerErrorKind {
    NotFound,
    Validation,
    Internal,
    Unauthorized,
    Forbidden,
    BadRequest,
    TooManyRequests,
    Unavailable,
}

impl std::fmt::Display for HandlerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandlerErrorKind::NotFound => "NotFound",
            HandlerErrorKind::Validation => "Validation",
            HandlerErrorKind::Internal => "Internal",
            HandlerErrorKind::Unauthorized => "Unauthorized",
            HandlerErrorKind::Forbidden => "Forbidden",
            HandlerErrorKind::BadRequest => "BadRequest",
            HandlerErrorKind::TooManyRequests => "TooManyRequests",
            HandlerErrorKind::Unavailable => "Unavailable",
        };
        write!(f, "{}", s)
    }
}

impl HandlerErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerErrorKind::NotFound => StatusCode::NOT_FOUND,
            HandlerErrorKind::Validation | HandlerErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            HandlerErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            HandlerErrorKind::Forbidden => StatusCode::FORBIDDEN,
            HandlerErrorKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            HandlerErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            HandlerErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// HTTP-facing error. Renders as `{success:false, message, error?, errors?}`.
#[derive(Debug)]
pub struct HandlerError {
    pub kind: HandlerErrorKind,
    pub message: String,
    /// Underlying cause, only rendered when `expose_details` is set
    pub details: Option<String>,
    pub errors: Vec<FieldError>,
    pub retry_after: Option<u64>,
    pub expose_details: bool,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "no_field_errors")]
    errors: &'a [FieldError],
}

fn no_field_errors(errors: &&[FieldError]) -> bool {
    errors.is_empty()
}

impl HandlerError {
    pub fn new(kind: HandlerErrorKind, message: impl Into<String>) -> Self {
        HandlerError {
            kind,
            message: message.into(),
            details: None,
            errors: Vec::new(),
            retry_after: None,
            expose_details: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Only development mode puts the cause in the body.
    pub fn expose_details(mut self, expose: bool) -> Self {
        self.expose_details = expose;
        self
    }

    /// Map a service failure. `internal_message` replaces the cause for
    /// store failures, which are never shown verbatim.
    pub fn from_service(err: ServiceError, internal_message: &str, expose: bool) -> Self {
        let handler_error = match err {
            ServiceError::Validation(errors) => HandlerError {
                errors,
                ..HandlerError::new(HandlerErrorKind::Validation, "Validation failed")
            },
            ServiceError::NotFound(what) => {
                HandlerError::new(HandlerErrorKind::NotFound, format!("{} not found", what))
            }
            ServiceError::InvalidStatus(e) => HandlerError::new(HandlerErrorKind::BadRequest, e.to_string()),
            ServiceError::Unauthorized(msg) => HandlerError::new(HandlerErrorKind::Unauthorized, msg),
            ServiceError::InternalError(cause) => {
                HandlerError::new(HandlerErrorKind::Internal, internal_message).with_details(cause)
            }
        };
        handler_error.expose_details(expose)
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for HandlerError {}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: &self.message,
            error: if self.expose_details { self.details.as_deref() } else { None },
            errors: &self.errors,
        };
        let mut response = (self.kind.status_code(), Json(body)).into_response();
        if let Some(secs) = self.retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation failed: {} field error(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl From<crate::repository::repository_error::RepositoryError> for ServiceError {
    fn from(err: crate::repository::repository_error::RepositoryError) -> Self {
        ServiceError::InternalError(err.to_string())
    }
}
