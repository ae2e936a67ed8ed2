// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the note-taking server.

pub mod config;
pub mod storage;
pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod validation;
pub mod handlers;
pub mod router;

use std::sync::Arc;
use std::time::Duration;
use dashmap::DashMap;

use crate::auth::{AuthService, DefaultAuth, SessionManager};
use crate::config::Settings;
use crate::middleware::rate_limit::RateLimitEntry;
use crate::storage::Storage;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState<S> {
    /// Authentication service, built once at startup with its dependencies
    /// injected
    pub auth: Arc<dyn AuthService>,
    /// Settings manager
    pub settings: Arc<Settings>,
    /// Storage backend
    pub storage: S,
    /// Rate limiter windows, keyed by client IP
    pub rate_limits: Arc<DashMap<String, RateLimitEntry>>,
}

impl<S: Storage + Clone + 'static> AppState<S> {
    /// Create a new application state
    pub fn new(storage: S, settings: Settings) -> Self {
        let sessions = SessionManager::new(Duration::from_secs(settings.session_ttl_secs));
        let auth = Arc::new(DefaultAuth::new(
            storage.clone(),
            sessions,
            settings.password_requirements.clone(),
        ));

        Self {
            auth,
            settings: Arc::new(settings),
            storage,
            rate_limits: Arc::new(DashMap::new()),
        }
    }
}
