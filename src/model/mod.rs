pub mod lead;
pub mod enquiry;
pub mod contact;
pub mod user;
