use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::dto::contact_dto::ContactView;
use crate::dto::enquiry_dto::EnquiryView;
use crate::handler::lead_handler::{
    get_handler, list_handler, submit_contact_handler, submit_enquiry_handler, update_status_handler, LeadState,
};
use crate::middlewares::admin_middleware::{admin_auth, AdminAuthState};
use crate::middlewares::rate_limit_middleware::{rate_limit, RateLimitState};
use crate::model::contact::Contact;
use crate::model::enquiry::Enquiry;

pub fn enquiry_router(
    state: Arc<LeadState<Enquiry>>,
    admin_auth_state: Arc<AdminAuthState>,
    rate_limit_state: Arc<RateLimitState>,
) -> Router {
    // Public, rate limited
    let public = Router::new()
        .route("/api/enquiry/submit", post(submit_enquiry_handler))
        .route_layer(middleware::from_fn_with_state(rate_limit_state, rate_limit));

    let admin = Router::new()
        .route("/api/enquiry/all", get(list_handler::<Enquiry, EnquiryView>))
        .route("/api/enquiry/{id}", get(get_handler::<Enquiry, EnquiryView>))
        .route("/api/enquiry/{id}/status", put(update_status_handler::<Enquiry, EnquiryView>))
        .route_layer(middleware::from_fn_with_state(admin_auth_state, admin_auth));

    public.merge(admin).with_state(state)
}

pub fn contact_router(
    state: Arc<LeadState<Contact>>,
    admin_auth_state: Arc<AdminAuthState>,
    rate_limit_state: Arc<RateLimitState>,
) -> Router {
    let public = Router::new()
        .route("/api/contact/submit", post(submit_contact_handler))
        .route_layer(middleware::from_fn_with_state(rate_limit_state, rate_limit));

    let admin = Router::new()
        .route("/api/contact/all", get(list_handler::<Contact, ContactView>))
        .route("/api/contact/{id}", get(get_handler::<Contact, ContactView>))
        .route("/api/contact/{id}/status", put(update_status_handler::<Contact, ContactView>))
        .route_layer(middleware::from_fn_with_state(admin_auth_state, admin_auth));

    public.merge(admin).with_state(state)
}
