// ============================
// crates/backend-lib/src/middleware/require_auth.rs
// ============================
//! Request-level access gate.
use std::sync::Arc;
use axum::{
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::storage::Storage;
use crate::AppState;

/// Name of the browser session cookie
pub const SESSION_COOKIE: &str = "sid";

/// Admit only requests carrying a live session identity.
///
/// The resolved [`noteapp_common::SessionIdentity`] is inserted into request
/// extensions for downstream handlers. A missing cookie, an unknown token and
/// an expired session all collapse to the same redirect; the client cannot
/// tell them apart.
pub async fn require_auth<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(session_token);

    let identity = match token {
        Some(token) => state.auth.authenticate(&token).await,
        None => None,
    };

    match identity {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        },
        None => Redirect::to("/auth/login").into_response(),
    }
}

/// Extract the session token from a `Cookie` header value
pub fn session_token(cookie_header: &str) -> Option<String> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_single_cookie() {
        assert_eq!(session_token("sid=abc123"), Some("abc123".to_string()));
    }

    #[test]
    fn test_session_token_among_other_cookies() {
        assert_eq!(
            session_token("theme=dark; sid=abc123; lang=en"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_session_token_absent() {
        assert_eq!(session_token("theme=dark; lang=en"), None);
        assert_eq!(session_token(""), None);
    }

    #[test]
    fn test_session_token_does_not_match_prefixed_names() {
        assert_eq!(session_token("sidecar=xyz"), None);
    }
}
