pub mod dashboard;
pub mod moderation_service;
pub mod notification;
pub mod submission_service;
pub mod user_service;
