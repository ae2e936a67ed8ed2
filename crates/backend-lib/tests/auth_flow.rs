//! End-to-end auth flow tests: the real router, the real flat-file storage,
//! the production KDF parameters.
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

use backend_lib::{config::Settings, router::create_router, storage::FlatFileStorage, AppState};

const USERNAME: &str = "validusr";
const PASSWORD: &str = "Str0ng!Passw0rd";

fn test_app() -> (Router, TempDir) {
    let dir = tempdir().unwrap();
    let storage = FlatFileStorage::new(dir.path()).unwrap();
    let state = Arc::new(AppState::new(storage, Settings::default()));
    (create_router(state), dir)
}

fn form_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn credentials_body(username: &str, password: &str) -> String {
    format!(
        "username={}&password={}",
        urlencode(username),
        urlencode(password)
    )
}

fn urlencode(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, percent_encoding::NON_ALPHANUMERIC).to_string()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
}

async fn register(app: &Router, username: &str, password: &str) -> axum::response::Response {
    app.clone()
        .oneshot(form_request(
            "/auth/register",
            credentials_body(username, password),
        ))
        .await
        .unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> axum::response::Response {
    app.clone()
        .oneshot(form_request(
            "/auth/login",
            credentials_body(username, password),
        ))
        .await
        .unwrap()
}

/// Pull the `sid` cookie value out of a login response
fn session_cookie(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a session cookie")
        .to_str()
        .unwrap();
    let sid = set_cookie
        .split(';')
        .next()
        .unwrap()
        .strip_prefix("sid=")
        .expect("cookie should be named sid");
    format!("sid={sid}")
}

#[tokio::test]
async fn register_then_login_then_reach_notes() {
    let (app, _dir) = test_app();

    // Registration redirects to the login page, not into a session
    let response = register(&app, USERNAME, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    // Login binds a session and redirects to the notes listing
    let response = login(&app, USERNAME, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/notes");
    let cookie = session_cookie(&response);

    // The gate admits the session
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/notes")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn registration_validation_errors_return_to_the_form() {
    let (app, _dir) = test_app();

    // Weak password: no uppercase, no symbol
    let response = register(&app, USERNAME, "alllowercase123").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/register?error="));

    // Short username
    let response = register(&app, "five5", PASSWORD).await;
    assert!(location(&response).starts_with("/auth/register?error="));

    // Duplicate username, different spelling
    let response = register(&app, USERNAME, PASSWORD).await;
    assert_eq!(location(&response), "/auth/login");
    let response = register(&app, "  VALIDUSR ", PASSWORD).await;
    assert!(location(&response).starts_with("/auth/register?error="));
}

#[tokio::test]
async fn login_failures_share_one_generic_message() {
    let (app, _dir) = test_app();
    register(&app, USERNAME, PASSWORD).await;

    // Unknown user and wrong password produce byte-identical redirects
    let unknown = login(&app, "ghostusr", PASSWORD).await;
    let mismatch = login(&app, USERNAME, "Wr0ng!Passwrd").await;

    assert_eq!(unknown.status(), StatusCode::SEE_OTHER);
    assert_eq!(mismatch.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&unknown), location(&mismatch));
    assert!(location(&unknown).starts_with("/auth/login?error="));
    assert!(unknown.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn gate_denies_requests_without_a_session() {
    let (app, _dir) = test_app();

    for uri in ["/notes", "/users/profile", "/users/stats"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/auth/login", "{uri}");
    }

    // A made-up token is no better than no token
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/notes")
                .header(header::COOKIE, "sid=forged-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn logout_is_idempotent_and_ends_the_session() {
    let (app, _dir) = test_app();
    register(&app, USERNAME, PASSWORD).await;
    let cookie = session_cookie(&login(&app, USERNAME, PASSWORD).await);

    let logout = |cookie: String| {
        let app = app.clone();
        async move {
            app.oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/logout")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    let response = logout(cookie.clone()).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");

    // Second logout with the same dead cookie is still not an error
    let response = logout(cookie.clone()).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // The session is gone
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/notes")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn notes_crud_roundtrip() {
    let (app, _dir) = test_app();
    register(&app, USERNAME, PASSWORD).await;
    let cookie = session_cookie(&login(&app, USERNAME, PASSWORD).await);

    // Create
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/notes")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("title=First&content=Hello"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Missing content is a client error, not a silent success
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/notes")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("title=Only&content=%20"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // List contains exactly the created note
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/notes")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let notes: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["title"], "First");
}

#[tokio::test]
async fn profile_reports_the_logged_in_user() {
    let (app, _dir) = test_app();
    register(&app, USERNAME, PASSWORD).await;
    let cookie = session_cookie(&login(&app, USERNAME, PASSWORD).await);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/users/profile")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let profile: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(profile["username"], USERNAME);
    assert_eq!(profile["notes_count"], 0);
    // Login stamped last_login_at
    assert!(!profile["last_login_at"].is_null());
}

#[tokio::test]
async fn verify_password_and_account_deletion() {
    let (app, _dir) = test_app();
    register(&app, USERNAME, PASSWORD).await;
    let cookie = session_cookie(&login(&app, USERNAME, PASSWORD).await);

    // Wrong password is rejected with the generic credential error
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/verify-password")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"password":"Wr0ng!Passwrd"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct password verifies
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/verify-password")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(r#"{{"password":"{PASSWORD}"}}"#)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Deletion tears down the account and its session
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/users/account")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(r#"{{"password":"{PASSWORD}"}}"#)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/notes")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(location(&response), "/auth/login");

    // The login that backed the deleted account is gone too
    let response = login(&app, USERNAME, PASSWORD).await;
    assert!(location(&response).starts_with("/auth/login?error="));
}
