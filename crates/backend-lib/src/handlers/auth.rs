// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Registration, login and logout handlers.
//!
//! Validation failures are recovered here as form errors: the browser is sent
//! back to the form with the message in the `error` query parameter. Anything
//! else surfaces through [`AppError`] as an opaque server error.
use std::collections::HashMap;
use std::sync::Arc;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use zeroize::Zeroize;

use noteapp_common::CredentialsForm;

use crate::error::AppError;
use crate::middleware::{session_token, SESSION_COOKIE};
use crate::storage::Storage;
use crate::validation::sanitize_string;
use crate::AppState;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

/// Send the browser back to a form with the error message in the query string
fn redirect_with_error(path: &str, err: &AppError) -> Response {
    let sanitized = err.sanitized_message();
    let message = utf8_percent_encode(&sanitized, NON_ALPHANUMERIC);
    Redirect::to(&format!("{path}?error={message}")).into_response()
}

fn render_form(title: &str, action: &str, error: Option<&String>) -> Html<String> {
    let error_html = error
        .map(|e| format!("<p class=\"error\">{}</p>", sanitize_string(e)))
        .unwrap_or_default();
    Html(format!(
        "<!doctype html>\n<html><head><title>{title} - Note Taking App</title></head><body>\n\
         <h1>{title}</h1>\n{error_html}\
         <form method=\"post\" action=\"{action}\">\n\
         <label>Username <input type=\"text\" name=\"username\"></label>\n\
         <label>Password <input type=\"password\" name=\"password\"></label>\n\
         <button type=\"submit\">{title}</button>\n\
         </form>\n</body></html>\n"
    ))
}

/// Show register page
pub async fn register_page(Query(params): Query<HashMap<String, String>>) -> Html<String> {
    render_form("Register", REGISTER_PATH, params.get("error"))
}

/// Show login page
pub async fn login_page(Query(params): Query<HashMap<String, String>>) -> Html<String> {
    render_form("Login", LOGIN_PATH, params.get("error"))
}

/// Register a new user
pub async fn register<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Form(mut form): Form<CredentialsForm>,
) -> Response {
    let result = state.auth.register(&form.username, &form.password).await;
    form.password.zeroize();

    match result {
        // Registration does not authenticate; the user logs in next.
        Ok(_) => Redirect::to(LOGIN_PATH).into_response(),
        Err(e) if e.is_form_error() => redirect_with_error(REGISTER_PATH, &e),
        Err(e) => {
            tracing::error!(error = %e, "registration failed");
            e.into_response()
        },
    }
}

/// Log in an existing user
pub async fn login<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Form(mut form): Form<CredentialsForm>,
) -> Response {
    let result = state.auth.login(&form.username, &form.password).await;
    form.password.zeroize();

    match result {
        Ok((token, _identity)) => {
            let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
            ([(header::SET_COOKIE, cookie)], Redirect::to("/notes")).into_response()
        },
        Err(e) if e.is_form_error() => redirect_with_error(LOGIN_PATH, &e),
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            e.into_response()
        },
    }
}

/// Log out the current user.
///
/// Unguarded on purpose: logging out without a session (or twice) is not an
/// error, it just redirects.
pub async fn logout<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Response {
    if let Some(token) = headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(session_token)
    {
        state.auth.logout(&token).await;
    }

    let clear = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    ([(header::SET_COOKIE, clear)], Redirect::to(LOGIN_PATH)).into_response()
}
