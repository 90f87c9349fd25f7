use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::dto::contact_dto::{ContactRequest, ContactSummary};
use crate::dto::enquiry_dto::{EnquiryRequest, EnquirySummary};
use crate::dto::validation::parse_sanitized;
use crate::model::contact::Contact;
use crate::model::enquiry::Enquiry;
use crate::repository::lead_repo::LeadRepository;
use crate::service::notification::Notifier;
use crate::util::error::ServiceError;

/// Public form intake: sanitize, validate, persist, then notify.
#[async_trait]
pub trait SubmissionService: Send + Sync {
    async fn submit_enquiry(&self, body: Value) -> Result<EnquirySummary, ServiceError>;
    async fn submit_contact(&self, body: Value) -> Result<ContactSummary, ServiceError>;
}

pub struct SubmissionServiceImpl {
    pub enquiry_repo: Arc<dyn LeadRepository<Enquiry>>,
    pub contact_repo: Arc<dyn LeadRepository<Contact>>,
    pub notifier: Arc<dyn Notifier>,
}

impl SubmissionServiceImpl {
    pub fn new(
        enquiry_repo: Arc<dyn LeadRepository<Enquiry>>,
        contact_repo: Arc<dyn LeadRepository<Contact>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { enquiry_repo, contact_repo, notifier }
    }
}

#[async_trait]
impl SubmissionService for SubmissionServiceImpl {
    #[instrument(skip(self, body))]
    async fn submit_enquiry(&self, body: Value) -> Result<EnquirySummary, ServiceError> {
        let request: EnquiryRequest = parse_sanitized(body)?;
        let record = request.into_record().map_err(ServiceError::Validation)?;

        let saved = self.enquiry_repo.create(record).await.map_err(|e| {
            error!("Failed to persist enquiry: {}", e);
            ServiceError::from(e)
        })?;
        info!(id = ?saved.id, "Enquiry persisted");

        // Delivery outcome never changes the response.
        self.notifier.notify_enquiry(&saved).await;
        Ok(EnquirySummary::from(&saved))
    }

    #[instrument(skip(self, body))]
    async fn submit_contact(&self, body: Value) -> Result<ContactSummary, ServiceError> {
        let request: ContactRequest = parse_sanitized(body)?;
        let record = request.into_record().map_err(ServiceError::Validation)?;

        let saved = self.contact_repo.create(record).await.map_err(|e| {
            error!("Failed to persist contact message: {}", e);
            ServiceError::from(e)
        })?;
        info!(id = ?saved.id, "Contact message persisted");

        self.notifier.notify_contact(&saved).await;
        Ok(ContactSummary::from(&saved))
    }
}
