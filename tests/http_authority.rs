use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use academy_gate::auth::{Claims, Credentials};
use academy_gate::authority::{AuthorityError, HttpAuthority, Role, RoleAuthority, SessionAuthority};
use academy_gate::config::AuthorityConfig;
use academy_gate::gate::{Gate, GateSettings, RouteDecision, RoutePolicy};

const ANON_KEY: &str = "anon-key";
const USER_ID: &str = "4f9c2a3e-8b1d-4c5e-9a7f-2d6b8e0c1a3b";

/// Counters for the in-process stand-in authority
#[derive(Default)]
struct FakeAuthority {
    user_calls: AtomicUsize,
    token_calls: AtomicUsize,
}

fn user() -> Value {
    json!({ "id": USER_ID, "email": "student@academy.test", "aud": "authenticated" })
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(ANON_KEY) {
        return None;
    }
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn get_user(State(fake): State<Arc<FakeAuthority>>, headers: HeaderMap) -> Response {
    fake.user_calls.fetch_add(1, Ordering::SeqCst);
    match bearer(&headers) {
        Some("good-access") | Some("rotated-access") => Json(user()).into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response(),
    }
}

async fn token(
    State(fake): State<Arc<FakeAuthority>>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    fake.token_calls.fetch_add(1, Ordering::SeqCst);

    let accepted = match query.get("grant_type").map(String::as_str) {
        Some("refresh_token") => body["refresh_token"] == "good-refresh",
        Some("pkce") => body["auth_code"] == "good-code" && body["code_verifier"] == "verifier",
        _ => false,
    };

    if !accepted {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" }))).into_response();
    }

    Json(json!({
        "access_token": "rotated-access",
        "refresh_token": "rotated-refresh",
        "expires_in": 3600,
        "token_type": "bearer",
        "user": user(),
    }))
    .into_response()
}

async fn rpc(Path(function): Path<String>, headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some("good-access") | Some("rotated-access") => {}
        _ => return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "JWT expired" }))).into_response(),
    }
    match function.as_str() {
        "is_admin" => Json(json!(false)).into_response(),
        "is_super_admin" => Json(json!(true)).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn spawn_fake_authority() -> Result<(HttpAuthority, Arc<FakeAuthority>)> {
    let fake = Arc::new(FakeAuthority::default());
    let app = Router::new()
        .route("/auth/v1/user", get(get_user))
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/logout", post(logout))
        .route("/rest/v1/rpc/:function", post(rpc))
        .with_state(fake.clone());

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let authority = HttpAuthority::new(&AuthorityConfig {
        url: format!("http://127.0.0.1:{}", port),
        anon_key: ANON_KEY.to_string(),
        request_timeout_ms: 2_000,
    })?;
    Ok((authority, fake))
}

fn credentials(access: Option<&str>, refresh: Option<&str>) -> Credentials {
    Credentials::new(access.map(str::to_string), refresh.map(str::to_string))
}

fn expired_jwt() -> String {
    let claims = Claims {
        sub: USER_ID.to_string(),
        exp: chrono::Utc::now().timestamp() - 600,
        email: None,
        role: Some("authenticated".to_string()),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"authority-secret")).unwrap()
}

#[tokio::test]
async fn valid_access_token_resolves_in_one_call() -> Result<()> {
    let (authority, fake) = spawn_fake_authority().await?;

    let lookup = authority.resolve_session(&credentials(Some("good-access"), Some("good-refresh"))).await?;
    let identity = lookup.identity.context("expected an identity")?;
    assert_eq!(identity.id.to_string(), USER_ID);
    assert_eq!(identity.email.as_deref(), Some("student@academy.test"));
    assert!(lookup.refreshed.is_none());

    assert_eq!(fake.user_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fake.token_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn rejected_access_token_falls_back_to_refresh() -> Result<()> {
    let (authority, fake) = spawn_fake_authority().await?;

    let lookup = authority.resolve_session(&credentials(Some("revoked"), Some("good-refresh"))).await?;
    assert!(lookup.identity.is_some());
    let tokens = lookup.refreshed.context("expected rotated tokens")?;
    assert_eq!(tokens.access_token, "rotated-access");
    assert_eq!(tokens.refresh_token, "rotated-refresh");
    assert_eq!(tokens.expires_in, Some(3600));

    assert_eq!(fake.user_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fake.token_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn expired_access_token_refreshes_directly() -> Result<()> {
    let (authority, fake) = spawn_fake_authority().await?;

    let lookup = authority
        .resolve_session(&credentials(Some(&expired_jwt()), Some("good-refresh")))
        .await?;
    assert!(lookup.identity.is_some());
    assert!(lookup.refreshed.is_some());

    assert_eq!(fake.user_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fake.token_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn dead_sessions_are_marked_expired() -> Result<()> {
    let (authority, _fake) = spawn_fake_authority().await?;

    let lookup = authority.resolve_session(&credentials(Some("revoked"), Some("used-refresh"))).await?;
    assert!(lookup.identity.is_none());
    assert!(lookup.refreshed.is_none());
    assert!(lookup.expired);

    let lookup = authority.resolve_session(&credentials(Some("revoked"), None)).await?;
    assert!(lookup.identity.is_none());
    assert!(lookup.expired);

    let lookup = authority.resolve_session(&credentials(None, Some("used-refresh"))).await?;
    assert!(lookup.expired);

    // Nothing presented, nothing to expire
    let lookup = authority.resolve_session(&Credentials::anonymous()).await?;
    assert!(!lookup.expired);
    Ok(())
}

#[tokio::test]
async fn role_checks_read_rpc_booleans() -> Result<()> {
    let (authority, _fake) = spawn_fake_authority().await?;
    let session = credentials(Some("good-access"), None);

    assert!(!authority.has_role(&session, Role::Admin).await?);
    assert!(authority.has_role(&session, Role::SuperAdmin).await?);

    let err = authority
        .has_role(&credentials(Some("revoked"), None), Role::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthorityError::Rejected { status: 401, .. }), "{:?}", err);
    Ok(())
}

#[tokio::test]
async fn code_exchange_and_sign_out() -> Result<()> {
    let (authority, _fake) = spawn_fake_authority().await?;

    let session = authority.exchange_code("good-code", Some("verifier")).await?;
    assert_eq!(session.identity.id.to_string(), USER_ID);
    assert_eq!(session.tokens.access_token, "rotated-access");

    let err = authority.exchange_code("good-code", None).await.unwrap_err();
    assert!(matches!(err, AuthorityError::Rejected { status: 400, .. }), "{:?}", err);

    authority.sign_out(&credentials(Some("good-access"), None)).await?;
    Ok(())
}

#[tokio::test]
async fn gate_over_http_authority() -> Result<()> {
    let (authority, _fake) = spawn_fake_authority().await?;
    let authority = Arc::new(authority);
    let gate = Gate::new(
        RoutePolicy::academy(),
        authority.clone(),
        authority,
        GateSettings::default(),
    );

    // is_super_admin answers true
    let outcome = gate
        .evaluate("/admin/reports", &credentials(Some("good-access"), None))
        .await;
    assert_eq!(outcome.decision, RouteDecision::Allow);

    // Rotated session is used for the role checks after a refresh
    let outcome = gate
        .evaluate("/admin/reports", &credentials(Some(&expired_jwt()), Some("good-refresh")))
        .await;
    assert_eq!(outcome.decision, RouteDecision::Allow);
    assert!(outcome.refreshed.is_some());

    let outcome = gate.evaluate("/profile", &Credentials::anonymous()).await;
    assert!(!outcome.is_allowed());
    Ok(())
}
