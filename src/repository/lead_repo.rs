use std::marker::PhantomData;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::{
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Client, Collection,
};
use tracing::{error, info, instrument};

use crate::model::lead::{timestamp, LeadDocument, LeadStatus};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

/// Narrows a count to one status and/or to records created after an instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    /// Exclusive lower bound on createdAt
    pub created_after: Option<DateTime<Utc>>,
}

impl LeadFilter {
    pub fn with_status(status: LeadStatus) -> Self {
        LeadFilter { status: Some(status), ..LeadFilter::default() }
    }

    pub fn created_after(at: DateTime<Utc>) -> Self {
        LeadFilter { created_after: Some(at), ..LeadFilter::default() }
    }

    /// Query document. createdAt is stored in the fixed-width `timestamp`
    /// format, so string comparison is chronological.
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(status) = self.status {
            filter.insert("status", status.as_str());
        }
        if let Some(at) = self.created_after {
            filter.insert("createdAt", doc! { "$gt": timestamp(at) });
        }
        filter
    }
}

/// Fields written by a status change.
pub fn status_changes(status: LeadStatus, now: DateTime<Utc>) -> Document {
    doc! { "status": status.as_str(), "updatedAt": timestamp(now) }
}

/// Store operations for one lead collection.
#[async_trait]
pub trait LeadRepository<T: LeadDocument>: Send + Sync {
    /// Persist a new record; the store assigns id, createdAt and updatedAt.
    async fn create(&self, record: T) -> RepositoryResult<T>;
    async fn find_by_id(&self, id: ObjectId) -> RepositoryResult<Option<T>>;
    /// Newest first. `page` starts at 1.
    async fn list(&self, page: u64, limit: u64) -> RepositoryResult<Vec<T>>;
    async fn count(&self) -> RepositoryResult<u64>;
    async fn count_where(&self, filter: LeadFilter) -> RepositoryResult<u64>;
    /// Returns the document as it is after the update, or None if no
    /// record has that id.
    async fn update_status(&self, id: ObjectId, status: LeadStatus) -> RepositoryResult<Option<T>>;
}

pub struct MongoLeadRepository<T: LeadDocument> {
    collection: Collection<T>,
    _kind: PhantomData<T>,
}

impl<T: LeadDocument> MongoLeadRepository<T> {
    pub fn new(client: &Client, database: &str, collection_name: &str) -> Self {
        let collection = client.database(database).collection::<T>(collection_name);
        MongoLeadRepository { collection, _kind: PhantomData }
    }
}

#[async_trait]
impl<T: LeadDocument> LeadRepository<T> for MongoLeadRepository<T> {
    #[instrument(skip(self, record), fields(kind = %T::KIND))]
    async fn create(&self, mut record: T) -> RepositoryResult<T> {
        record.assign_identity(ObjectId::new(), &timestamp(Utc::now()));

        match self.collection.insert_one(&record, None).await {
            Ok(_) => {
                info!(id = ?record.id(), "{} created", T::KIND.label());
                Ok(record)
            }
            Err(e) => {
                error!("Failed to create {}: {}", T::KIND, e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[instrument(skip(self), fields(kind = %T::KIND, id = %id))]
    async fn find_by_id(&self, id: ObjectId) -> RepositoryResult<Option<T>> {
        self.collection
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| {
                error!("Failed to fetch {} by id: {}", T::KIND, e);
                RepositoryError::from(e)
            })
    }

    #[instrument(skip(self), fields(kind = %T::KIND))]
    async fn list(&self, page: u64, limit: u64) -> RepositoryResult<Vec<T>> {
        let skip = page.saturating_sub(1).saturating_mul(limit);
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .skip(Some(skip))
            .limit(Some(limit as i64))
            .build();

        let cursor = self.collection.find(None, options).await.map_err(|e| {
            error!("Failed to list {}: {}", T::KIND, e);
            RepositoryError::from(e)
        })?;
        let records: Vec<T> = cursor.try_collect().await.map_err(|e| {
            error!("Failed to read {} cursor: {}", T::KIND, e);
            RepositoryError::from(e)
        })?;
        info!(page, limit, fetched = records.len(), "Listed {}", T::KIND);
        Ok(records)
    }

    #[instrument(skip(self), fields(kind = %T::KIND))]
    async fn count(&self) -> RepositoryResult<u64> {
        self.collection.count_documents(None, None).await.map_err(|e| {
            error!("Failed to count {}: {}", T::KIND, e);
            RepositoryError::from(e)
        })
    }

    #[instrument(skip(self), fields(kind = %T::KIND))]
    async fn count_where(&self, filter: LeadFilter) -> RepositoryResult<u64> {
        self.collection
            .count_documents(filter.to_document(), None)
            .await
            .map_err(|e| {
                error!("Failed to count {} matching {:?}: {}", T::KIND, filter, e);
                RepositoryError::from(e)
            })
    }

    #[instrument(skip(self), fields(kind = %T::KIND, id = %id, status = %status))]
    async fn update_status(&self, id: ObjectId, status: LeadStatus) -> RepositoryResult<Option<T>> {
        let update = doc! { "$set": status_changes(status, Utc::now()) };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await
            .map_err(|e| {
                error!("Failed to update {} status: {}", T::KIND, e);
                RepositoryError::from(e)
            })?;
        if updated.is_some() {
            info!("{} status updated", T::KIND.label());
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(LeadFilter::default().to_document().is_empty());
    }

    #[test]
    fn test_filter_documents() {
        assert_eq!(LeadFilter::with_status(LeadStatus::Pending).to_document(), doc! { "status": "pending" });
        assert_eq!(
            LeadFilter::created_after(at("2026-10-11T12:00:00Z")).to_document(),
            doc! { "createdAt": { "$gt": "2026-10-11T12:00:00.000Z" } }
        );
    }

    #[test]
    fn test_status_changes() {
        assert_eq!(
            status_changes(LeadStatus::Reviewed, at("2026-10-18T09:30:00Z")),
            doc! { "status": "reviewed", "updatedAt": "2026-10-18T09:30:00.000Z" }
        );
    }
}
