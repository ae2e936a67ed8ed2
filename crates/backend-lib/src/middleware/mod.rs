// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the note-taking server.

pub mod rate_limit;
pub mod require_auth;

pub use rate_limit::rate_limit;
pub use require_auth::{require_auth, session_token, SESSION_COOKIE};
