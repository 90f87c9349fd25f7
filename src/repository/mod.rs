pub mod repository_error;
pub mod mongo;
pub mod lead_repo;
pub mod user_repo;
