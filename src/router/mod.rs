pub mod admin_router;
pub mod lead_router;
