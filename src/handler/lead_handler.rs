use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::dto::lead_dto::{ApiResponse, ListQuery, StatusUpdateRequest};
use crate::handler::json_body;
use crate::model::contact::Contact;
use crate::model::enquiry::Enquiry;
use crate::model::lead::{LeadDocument, LeadKind};
use crate::service::moderation_service::ModerationService;
use crate::service::submission_service::SubmissionService;
use crate::util::error::{HandlerError, ServiceError};

/// Handler state for one lead kind.
pub struct LeadState<T: LeadDocument> {
    pub submission: Arc<dyn SubmissionService>,
    pub moderation: Arc<dyn ModerationService<T>>,
    /// Development mode: error causes are rendered in responses
    pub expose_details: bool,
}

struct KindMessages {
    submitted: &'static str,
    submit_failed: &'static str,
    list_failed: &'static str,
    get_failed: &'static str,
    status_failed: &'static str,
}

fn messages(kind: LeadKind) -> KindMessages {
    match kind {
        LeadKind::Enquiry => KindMessages {
            submitted: "Project enquiry submitted successfully",
            submit_failed: "Failed to submit enquiry. Please try again.",
            list_failed: "Failed to fetch enquiries",
            get_failed: "Failed to fetch enquiry",
            status_failed: "Failed to update enquiry status",
        },
        LeadKind::Contact => KindMessages {
            submitted: "Message sent successfully",
            submit_failed: "Failed to send message. Please try again.",
            list_failed: "Failed to fetch contacts",
            get_failed: "Failed to fetch contact message",
            status_failed: "Failed to update contact status",
        },
    }
}

fn failure(err: ServiceError, internal_message: &str, expose: bool) -> HandlerError {
    if matches!(err, ServiceError::InternalError(_)) {
        error!("{}: {}", internal_message, err);
    }
    HandlerError::from_service(err, internal_message, expose)
}

#[instrument(skip(state, body))]
pub async fn submit_enquiry_handler(
    State(state): State<Arc<LeadState<Enquiry>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let text = messages(LeadKind::Enquiry);
    let body = json_body(body)?;
    let summary = state
        .submission
        .submit_enquiry(body)
        .await
        .map_err(|e| failure(e, text.submit_failed, state.expose_details))?;
    info!(id = %summary.id, "Enquiry submitted");
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(text.submitted, summary))))
}

#[instrument(skip(state, body))]
pub async fn submit_contact_handler(
    State(state): State<Arc<LeadState<Contact>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let text = messages(LeadKind::Contact);
    let body = json_body(body)?;
    let summary = state
        .submission
        .submit_contact(body)
        .await
        .map_err(|e| failure(e, text.submit_failed, state.expose_details))?;
    info!(id = %summary.id, "Contact message submitted");
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(text.submitted, summary))))
}

/// `GET /api/{kind}/all?page=&limit=`, newest first.
pub async fn list_handler<T, V>(
    State(state): State<Arc<LeadState<T>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<V>>>, HandlerError>
where
    T: LeadDocument,
    V: From<T> + Serialize,
{
    let (page, limit) = query.resolve();
    let page = state
        .moderation
        .list(page, limit)
        .await
        .map_err(|e| failure(e, messages(T::KIND).list_failed, state.expose_details))?;
    Ok(Json(ApiResponse::page(page.map(V::from))))
}

pub async fn get_handler<T, V>(
    State(state): State<Arc<LeadState<T>>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<V>>, HandlerError>
where
    T: LeadDocument,
    V: From<T> + Serialize,
{
    let record = state
        .moderation
        .get_by_id(&id)
        .await
        .map_err(|e| failure(e, messages(T::KIND).get_failed, state.expose_details))?;
    Ok(Json(ApiResponse::ok(V::from(record))))
}

pub async fn update_status_handler<T, V>(
    State(state): State<Arc<LeadState<T>>>,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<V>>, HandlerError>
where
    T: LeadDocument,
    V: From<T> + Serialize,
{
    // A missing or unreadable body is reported as an invalid status.
    let request = json_body(body).unwrap_or_default();
    let record = state
        .moderation
        .set_status(&id, request.status.as_deref())
        .await
        .map_err(|e| failure(e, messages(T::KIND).status_failed, state.expose_details))?;
    Ok(Json(ApiResponse::ok(V::from(record))))
}
