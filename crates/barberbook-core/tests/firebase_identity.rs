use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Json, Router};
use barberbook_core::auth::{AuthFailure, FirebaseIdentity, IdentityProvider};
use serde::Deserialize;
use serde_json::{json, Value};

/// Minimal Identity Toolkit / Secure Token emulator.
#[derive(Clone, Default)]
struct FakeFirebase {
    refreshes: Arc<AtomicUsize>,
}

#[derive(Deserialize)]
struct KeyQuery {
    key: String,
}

#[derive(Deserialize)]
struct RefreshForm {
    grant_type: String,
    refresh_token: String,
}

fn provider_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": {"code": 400, "message": message}})),
    )
        .into_response()
}

async fn sign_in(Query(q): Query<KeyQuery>, Json(body): Json<Value>) -> Response {
    if q.key != "test-key" {
        return provider_error("API key not valid. Please pass a valid API key.");
    }
    if body["password"] != "correct-horse" {
        return provider_error("INVALID_LOGIN_CREDENTIALS");
    }
    Json(json!({
        "localId": "uid-42",
        "email": body["email"],
        "idToken": "id-1",
        "refreshToken": "ref-1",
        "expiresIn": "3600",
        "registered": true
    }))
    .into_response()
}

async fn sign_up(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@example.com" {
        return provider_error("EMAIL_EXISTS");
    }
    provider_error("WEAK_PASSWORD : Password should be at least 6 characters")
}

async fn refresh(State(fake): State<FakeFirebase>, Form(form): Form<RefreshForm>) -> Response {
    fake.refreshes.fetch_add(1, Ordering::SeqCst);
    if form.grant_type != "refresh_token" || !form.refresh_token.starts_with("ref-") {
        return provider_error("INVALID_REFRESH_TOKEN");
    }
    Json(json!({
        "id_token": format!("id-{}", fake.refreshes.load(Ordering::SeqCst) + 1),
        "refresh_token": "ref-2",
        "user_id": "uid-42",
        "expires_in": "3600",
        "token_type": "Bearer"
    }))
    .into_response()
}

async fn spawn_firebase() -> (FirebaseIdentity, FakeFirebase) {
    let fake = FakeFirebase::default();
    let app = Router::new()
        .route("/v1/accounts:signInWithPassword", post(sign_in))
        .route("/v1/accounts:signUp", post(sign_up))
        .route("/v1/token", post(refresh))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base = format!("http://{}/v1", addr);
    let identity = FirebaseIdentity::with_endpoints("test-key", &base, &base).unwrap();
    (identity, fake)
}

#[tokio::test]
async fn test_sign_in_and_refresh() {
    let (identity, fake) = spawn_firebase().await;

    let session = identity.sign_in("ana@example.com", "correct-horse").await.unwrap();
    assert_eq!(session.user_id, "uid-42");
    assert_eq!(session.id_token, "id-1");

    // cached token is still valid
    assert_eq!(identity.refresh_token(false).await.unwrap().id_token, "id-1");
    assert_eq!(fake.refreshes.load(Ordering::SeqCst), 0);

    let refreshed = identity.refresh_token(true).await.unwrap();
    assert_eq!(refreshed.id_token, "id-2");
    assert_eq!(refreshed.refresh_token, "ref-2");
    assert_eq!(fake.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sign_in_rejected() {
    let (identity, _) = spawn_firebase().await;
    assert_eq!(
        identity.sign_in("ana@example.com", "wrong").await.unwrap_err(),
        AuthFailure::InvalidCredential
    );
    assert_eq!(
        identity.refresh_token(true).await.unwrap_err(),
        AuthFailure::NoSession
    );
}

#[tokio::test]
async fn test_sign_up_errors() {
    let (identity, _) = spawn_firebase().await;
    assert_eq!(
        identity.sign_up("taken@example.com", "whatever").await.unwrap_err(),
        AuthFailure::EmailInUse
    );
    assert_eq!(
        identity.sign_up("new@example.com", "123").await.unwrap_err(),
        AuthFailure::WeakSecret
    );
}

#[tokio::test]
async fn test_restored_session_refreshes_and_bad_token_ends_it() {
    let (identity, fake) = spawn_firebase().await;

    identity.restore("uid-42", "ref-1").await;
    assert_eq!(identity.refresh_token(false).await.unwrap().id_token, "id-2");

    let (other, _) = spawn_firebase().await;
    other.restore("uid-42", "revoked").await;
    assert_eq!(
        other.refresh_token(true).await.unwrap_err(),
        AuthFailure::NoSession
    );
    // session dropped after the provider refused the refresh token
    assert_eq!(
        other.refresh_token(true).await.unwrap_err(),
        AuthFailure::NoSession
    );
    assert_eq!(fake.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sign_out_forgets_session() {
    let (identity, _) = spawn_firebase().await;
    identity.sign_in("ana@example.com", "correct-horse").await.unwrap();
    identity.sign_out().await.unwrap();
    assert_eq!(
        identity.refresh_token(false).await.unwrap_err(),
        AuthFailure::NoSession
    );
}
