use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::dto::validation::{add_error, is_valid_phone, non_blank, to_field_errors};
use crate::model::enquiry::{Budget, Enquiry};
use crate::model::lead::LeadStatus;
use crate::util::error::FieldError;

const FIELD_ORDER: [&str; 8] = [
    "fullName",
    "email",
    "phone",
    "location",
    "interestedIn",
    "budget",
    "message",
    "projectName",
];

/// Body of `POST /api/enquiry/submit`. Every field is optional at the
/// binding level so that missing fields surface as field errors.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryRequest {
    #[validate(
        required(message = "Full name is required"),
        length(min = 1, max = 100, message = "Full name must be between 1 and 100 characters")
    )]
    pub full_name: Option<String>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Please provide a valid email address")
    )]
    pub email: Option<String>,

    #[validate(required(message = "Phone number is required"))]
    pub phone: Option<String>,

    #[validate(length(max = 100, message = "Location must not exceed 100 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 100, message = "Interested in field must not exceed 100 characters"))]
    pub interested_in: Option<String>,

    pub budget: Option<String>,

    #[validate(length(max = 1000, message = "Message must not exceed 1000 characters"))]
    pub message: Option<String>,

    #[validate(length(max = 100, message = "Project name must not exceed 100 characters"))]
    pub project_name: Option<String>,
}

impl EnquiryRequest {
    fn normalize(self) -> Self {
        EnquiryRequest {
            full_name: self.full_name.map(|v| v.trim().to_string()),
            email: self.email.map(|v| v.trim().to_lowercase()),
            phone: self.phone.map(|v| v.trim().to_string()),
            location: non_blank(self.location),
            interested_in: non_blank(self.interested_in),
            budget: non_blank(self.budget),
            message: non_blank(self.message),
            project_name: non_blank(self.project_name),
        }
    }

    fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };

        if let Some(phone) = &self.phone {
            if phone.is_empty() {
                add_error(&mut errors, "phone", "required", "Phone number is required");
            } else if !is_valid_phone(phone) {
                add_error(&mut errors, "phone", "phone", "Please provide a valid phone number");
            }
        }
        if let Some(budget) = &self.budget {
            if Budget::from_code(budget).is_none() {
                add_error(&mut errors, "budget", "budget", "Invalid budget range selected");
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Normalize, validate and build the record to persist, with status
    /// pending and no identity yet.
    pub fn into_record(self) -> Result<Enquiry, Vec<FieldError>> {
        let request = self.normalize();
        request
            .check()
            .map_err(|errors| to_field_errors(&errors, &FIELD_ORDER))?;

        Ok(Enquiry {
            id: None,
            full_name: request.full_name.unwrap_or_default(),
            email: request.email.unwrap_or_default(),
            phone: request.phone.unwrap_or_default(),
            location: request.location,
            interested_in: request.interested_in,
            budget: request.budget,
            message: request.message,
            project_name: request.project_name,
            status: LeadStatus::Pending,
            created_at: None,
            updated_at: None,
        })
    }
}

/// Enquiry as returned by the API, with a hex id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryView {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interested_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub status: LeadStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<Enquiry> for EnquiryView {
    fn from(e: Enquiry) -> Self {
        EnquiryView {
            id: e.id.map(|id| id.to_hex()).unwrap_or_default(),
            full_name: e.full_name,
            email: e.email,
            phone: e.phone,
            location: e.location,
            interested_in: e.interested_in,
            budget: e.budget,
            message: e.message,
            project_name: e.project_name,
            status: e.status,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// `data` of a successful submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquirySummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub interested_in: Option<String>,
    pub created_at: Option<String>,
}

impl From<&Enquiry> for EnquirySummary {
    fn from(e: &Enquiry) -> Self {
        EnquirySummary {
            id: e.id.map(|id| id.to_hex()).unwrap_or_default(),
            full_name: e.full_name.clone(),
            email: e.email.clone(),
            interested_in: e.interested_in.clone(),
            created_at: e.created_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> EnquiryRequest {
        EnquiryRequest {
            full_name: Some("Asha Rao".to_string()),
            email: Some("  Asha.Rao@Example.COM ".to_string()),
            phone: Some("+91 98765 43210".to_string()),
            budget: Some("1cr-2cr".to_string()),
            ..EnquiryRequest::default()
        }
    }

    #[test]
    fn test_valid_request_builds_pending_record() {
        let record = valid().into_record().unwrap();
        assert_eq!(record.email, "asha.rao@example.com");
        assert_eq!(record.status, LeadStatus::Pending);
        assert_eq!(record.budget.as_deref(), Some("1cr-2cr"));
        assert!(record.id.is_none());
    }

    #[test]
    fn test_missing_phone_is_named() {
        let request = EnquiryRequest { phone: None, ..valid() };
        let errors = request.into_record().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "phone");
    }

    #[test]
    fn test_unknown_budget_rejected() {
        let request = EnquiryRequest { budget: Some("10cr".to_string()), ..valid() };
        let errors = request.into_record().unwrap_err();
        assert_eq!(errors[0].field, "budget");
    }

    #[test]
    fn test_blank_budget_treated_as_absent() {
        let request = EnquiryRequest { budget: Some("".to_string()), ..valid() };
        assert!(request.into_record().unwrap().budget.is_none());
    }

    #[test]
    fn test_errors_reported_in_form_order() {
        let request = EnquiryRequest {
            full_name: None,
            email: Some("not-an-email".to_string()),
            phone: Some("abc".to_string()),
            message: Some("x".repeat(1001)),
            ..EnquiryRequest::default()
        };
        let fields: Vec<String> = request.into_record().unwrap_err().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["fullName", "email", "phone", "message"]);
    }
}
