use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::model::lead::{LeadDocument, LeadKind, LeadStatus};

/// Message submitted from the contact page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// One of `SERVICE_CATEGORIES`
    pub service: String,
    pub message: String,
    #[serde(default)]
    pub status: LeadStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl LeadDocument for Contact {
    const KIND: LeadKind = LeadKind::Contact;

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn assign_identity(&mut self, id: ObjectId, now: &str) {
        self.id = Some(id);
        self.created_at = Some(now.to_string());
        self.updated_at = Some(now.to_string());
    }
}

pub const SERVICE_CATEGORIES: [&str; 7] = [
    "Residential Construction",
    "Commercial Projects",
    "Sales & Leasing",
    "Interior Design",
    "Project Management",
    "Legal Documentation",
    "Other",
];

pub fn is_known_service(service: &str) -> bool {
    SERVICE_CATEGORIES.contains(&service)
}
