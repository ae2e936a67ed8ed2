// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod session;
mod service;
mod service_impl;

pub use password::{
    hash_password, validate_password_strength, verify_password, PBKDF2_ITERATIONS, SALT_LEN,
};
pub use session::{Session, SessionManager, SESSION_TTL};
pub use service::AuthService;
pub use service_impl::{project_to_session, DefaultAuth};
