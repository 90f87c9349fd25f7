pub mod email;
pub mod error;
pub mod jwt;
pub mod logger;
pub mod password;
pub mod rate_limiter;
pub mod redis;
pub mod sanitize;
pub mod session;
