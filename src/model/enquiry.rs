use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::model::lead::{LeadDocument, LeadKind, LeadStatus};

/// Project enquiry submitted from the enquiry form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: Option<String>,
    pub interested_in: Option<String>,
    /// One of the `Budget` codes
    pub budget: Option<String>,
    pub message: Option<String>,
    pub project_name: Option<String>,
    #[serde(default)]
    pub status: LeadStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl LeadDocument for Enquiry {
    const KIND: LeadKind = LeadKind::Enquiry;

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn assign_identity(&mut self, id: ObjectId, now: &str) {
        self.id = Some(id);
        self.created_at = Some(now.to_string());
        self.updated_at = Some(now.to_string());
    }
}

/// Budget ranges offered by the enquiry form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Under50L,
    From50LTo1Cr,
    From1CrTo2Cr,
    From2CrTo5Cr,
    Above5Cr,
}

impl Budget {
    pub const ALL: [Budget; 5] = [
        Budget::Under50L,
        Budget::From50LTo1Cr,
        Budget::From1CrTo2Cr,
        Budget::From2CrTo5Cr,
        Budget::Above5Cr,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Budget::Under50L => "under-50l",
            Budget::From50LTo1Cr => "50l-1cr",
            Budget::From1CrTo2Cr => "1cr-2cr",
            Budget::From2CrTo5Cr => "2cr-5cr",
            Budget::Above5Cr => "above-5cr",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            Budget::Under50L => "Under ₹50 Lakhs",
            Budget::From50LTo1Cr => "₹50 Lakhs - ₹1 Crore",
            Budget::From1CrTo2Cr => "₹1 - ₹2 Crores",
            Budget::From2CrTo5Cr => "₹2 - ₹5 Crores",
            Budget::Above5Cr => "Above ₹5 Crores",
        }
    }

    pub fn from_code(code: &str) -> Option<Budget> {
        Budget::ALL.into_iter().find(|b| b.code() == code)
    }

    /// Display string for a stored code; unknown codes render verbatim.
    pub fn display_for(code: &str) -> String {
        Budget::from_code(code)
            .map(|b| b.display().to_string())
            .unwrap_or_else(|| code.to_string())
    }
}
