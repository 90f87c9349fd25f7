//! Types shared by both lead kinds.

use bson::oid::ObjectId;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Moderation state of a lead. Any value may be written by the
/// moderation operation; ordering is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    Pending,
    Reviewed,
    Responded,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 3] = [LeadStatus::Pending, LeadStatus::Reviewed, LeadStatus::Responded];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::Reviewed => "reviewed",
            LeadStatus::Responded => "responded",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status value: {0}")]
pub struct InvalidStatus(pub String);

impl FromStr for LeadStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

/// Discriminates the two lead record shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadKind {
    Enquiry,
    Contact,
}

impl LeadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadKind::Enquiry => "enquiry",
            LeadKind::Contact => "contact",
        }
    }

    /// Human label used in log lines and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            LeadKind::Enquiry => "Enquiry",
            LeadKind::Contact => "Contact message",
        }
    }
}

impl fmt::Display for LeadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamp format written on every lead. Fixed width UTC so that
/// lexicographic order in the store matches chronological order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A document persisted in one of the lead collections.
pub trait LeadDocument:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + Unpin + 'static
{
    const KIND: LeadKind;

    fn id(&self) -> Option<ObjectId>;

    /// Stamp identity and both timestamps, as the store does on create.
    fn assign_identity(&mut self, id: ObjectId, now: &str);
}
