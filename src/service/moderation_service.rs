use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tracing::{info, instrument, warn};

use crate::dto::lead_dto::{Page, Pagination};
use crate::model::lead::{InvalidStatus, LeadDocument, LeadStatus};
use crate::repository::lead_repo::LeadRepository;
use crate::util::error::ServiceError;

/// Admin reads and status changes for one lead kind.
#[async_trait]
pub trait ModerationService<T: LeadDocument>: Send + Sync {
    /// Newest first. `page` and `limit` are already clamped.
    async fn list(&self, page: u64, limit: u64) -> Result<Page<T>, ServiceError>;
    async fn get_by_id(&self, id: &str) -> Result<T, ServiceError>;
    /// The status is checked before the store is touched.
    async fn set_status(&self, id: &str, status: Option<&str>) -> Result<T, ServiceError>;
}

pub struct ModerationServiceImpl<T: LeadDocument> {
    repo: Arc<dyn LeadRepository<T>>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: LeadDocument> ModerationServiceImpl<T> {
    pub fn new(repo: Arc<dyn LeadRepository<T>>) -> Self {
        Self { repo, _kind: PhantomData }
    }

    fn not_found() -> ServiceError {
        ServiceError::NotFound(T::KIND.label().to_string())
    }

    /// A malformed id cannot name a stored record, so it reads as absent.
    fn parse_id(id: &str) -> Result<ObjectId, ServiceError> {
        ObjectId::parse_str(id).map_err(|_| {
            warn!(id, kind = T::KIND.as_str(), "Malformed lead id");
            Self::not_found()
        })
    }
}

#[async_trait]
impl<T: LeadDocument> ModerationService<T> for ModerationServiceImpl<T> {
    #[instrument(skip(self), fields(kind = T::KIND.as_str()))]
    async fn list(&self, page: u64, limit: u64) -> Result<Page<T>, ServiceError> {
        let (items, total) = tokio::try_join!(self.repo.list(page, limit), self.repo.count())?;
        Ok(Page { items, pagination: Pagination::new(page, limit, total) })
    }

    #[instrument(skip(self), fields(kind = T::KIND.as_str()))]
    async fn get_by_id(&self, id: &str) -> Result<T, ServiceError> {
        let oid = Self::parse_id(id)?;
        self.repo.find_by_id(oid).await?.ok_or_else(Self::not_found)
    }

    #[instrument(skip(self), fields(kind = T::KIND.as_str()))]
    async fn set_status(&self, id: &str, status: Option<&str>) -> Result<T, ServiceError> {
        let status: LeadStatus = status
            .ok_or_else(|| InvalidStatus(String::new()))?
            .parse()?;
        let oid = Self::parse_id(id)?;
        let updated = self
            .repo
            .update_status(oid, status)
            .await?
            .ok_or_else(Self::not_found)?;
        info!(id, status = status.as_str(), "Lead status updated");
        Ok(updated)
    }
}
