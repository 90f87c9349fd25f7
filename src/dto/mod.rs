pub mod validation;
pub mod enquiry_dto;
pub mod contact_dto;
pub mod lead_dto;
