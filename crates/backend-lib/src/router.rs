// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router wiring.
use std::sync::Arc;
use axum::{
    middleware::from_fn_with_state,
    response::Redirect,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, notes, users};
use crate::middleware::{rate_limit, require_auth};
use crate::storage::Storage;
use crate::AppState;

/// Create the application router
pub fn create_router<S: Storage + Clone + 'static>(state: Arc<AppState<S>>) -> Router {
    let auth_routes = Router::new()
        .route(
            "/register",
            get(auth::register_page).post(auth::register::<S>),
        )
        .route("/login", get(auth::login_page).post(auth::login::<S>))
        .route("/logout", post(auth::logout::<S>))
        .layer(from_fn_with_state(state.clone(), rate_limit::<S>));

    let note_routes = Router::new()
        .route("/", get(notes::list_notes::<S>).post(notes::create_note::<S>))
        .route(
            "/{id}",
            put(notes::update_note::<S>).delete(notes::remove_note::<S>),
        )
        .layer(from_fn_with_state(state.clone(), require_auth::<S>));

    let user_routes = Router::new()
        .route("/profile", get(users::profile::<S>))
        .route("/stats", get(users::stats::<S>))
        .route("/verify-password", post(users::verify_password::<S>))
        .route("/account", delete(users::remove_account::<S>))
        .layer(from_fn_with_state(state.clone(), require_auth::<S>));

    Router::new()
        .route("/", get(|| async { Redirect::to("/notes") }))
        .nest("/auth", auth_routes)
        .nest("/notes", note_routes)
        .nest("/users", user_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
