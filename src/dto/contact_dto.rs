use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::dto::validation::{add_error, is_letters_and_spaces, is_valid_phone, non_blank, to_field_errors};
use crate::model::contact::{is_known_service, Contact};
use crate::model::lead::LeadStatus;
use crate::util::error::FieldError;

const FIELD_ORDER: [&str; 5] = ["name", "email", "phone", "service", "message"];

/// Body of `POST /api/contact/submit`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(
        required(message = "Name is required"),
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Please provide a valid email address")
    )]
    pub email: Option<String>,

    pub phone: Option<String>,

    #[validate(required(message = "Service type is required"))]
    pub service: Option<String>,

    #[validate(
        required(message = "Message is required"),
        length(min = 10, max = 1000, message = "Message must be between 10 and 1000 characters")
    )]
    pub message: Option<String>,
}

impl ContactRequest {
    fn normalize(self) -> Self {
        ContactRequest {
            name: self.name.map(|v| v.trim().to_string()),
            email: self.email.map(|v| v.trim().to_lowercase()),
            phone: non_blank(self.phone),
            service: self.service.map(|v| v.trim().to_string()),
            message: self.message.map(|v| v.trim().to_string()),
        }
    }

    fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };

        // Length errors take precedence for the name field.
        if let Some(name) = &self.name {
            if !errors.field_errors().contains_key("name") && !is_letters_and_spaces(name) {
                add_error(&mut errors, "name", "name", "Name can only contain letters and spaces");
            }
        }
        if let Some(phone) = &self.phone {
            if !is_valid_phone(phone) {
                add_error(&mut errors, "phone", "phone", "Please provide a valid phone number");
            }
        }
        if let Some(service) = &self.service {
            if !is_known_service(service) {
                add_error(&mut errors, "service", "service", "Invalid service type selected");
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_record(self) -> Result<Contact, Vec<FieldError>> {
        let request = self.normalize();
        request
            .check()
            .map_err(|errors| to_field_errors(&errors, &FIELD_ORDER))?;

        Ok(Contact {
            id: None,
            name: request.name.unwrap_or_default(),
            email: request.email.unwrap_or_default(),
            phone: request.phone,
            service: request.service.unwrap_or_default(),
            message: request.message.unwrap_or_default(),
            status: LeadStatus::Pending,
            created_at: None,
            updated_at: None,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub service: String,
    pub message: String,
    pub status: LeadStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<Contact> for ContactView {
    fn from(c: Contact) -> Self {
        ContactView {
            id: c.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: c.name,
            email: c.email,
            phone: c.phone,
            service: c.service,
            message: c.message,
            status: c.status,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub service: String,
    pub created_at: Option<String>,
}

impl From<&Contact> for ContactSummary {
    fn from(c: &Contact) -> Self {
        ContactSummary {
            id: c.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: c.name.clone(),
            email: c.email.clone(),
            service: c.service.clone(),
            created_at: c.created_at.clone(),
        }
    }
}
