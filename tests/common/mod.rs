#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Body, http::{header, Request}, middleware, routing::get, Router};
use uuid::Uuid;

use academy_gate::auth::{Credentials, Identity, SessionTokens};
use academy_gate::authority::{
    AuthorityError, IssuedSession, Role, RoleAuthority, SessionAuthority, SessionLookup,
};
use academy_gate::gate::{Gate, GateSettings, RootFailurePolicy, RoutePolicy};
use academy_gate::middleware::{gate_middleware, CookieSettings};
use academy_gate::state::AppState;

pub const VALID_COOKIE: &str = "sb-access-token=valid-access; sb-refresh-token=valid-refresh";
pub const ROTATED_ACCESS: &str = "rotated-access";
pub const ROTATED_REFRESH: &str = "rotated-refresh";

#[derive(Clone)]
pub enum SessionScript {
    Anonymous,
    Authenticated,
    Refreshed,
    Expired,
    Fails,
    Hangs,
}

#[derive(Clone, Copy)]
pub enum RoleScript {
    Granted,
    Denied,
    Fails,
    Hangs,
}

/// Authority double answering from a script and counting every call
pub struct ScriptedAuthority {
    session: SessionScript,
    admin: RoleScript,
    super_admin: RoleScript,
    exchange_succeeds: bool,
    pub session_calls: AtomicUsize,
    pub role_calls: AtomicUsize,
    pub sign_outs: AtomicUsize,
    pub role_tokens: Mutex<Vec<String>>,
}

impl ScriptedAuthority {
    pub fn new(session: SessionScript) -> Self {
        Self {
            session,
            admin: RoleScript::Denied,
            super_admin: RoleScript::Denied,
            exchange_succeeds: true,
            session_calls: AtomicUsize::new(0),
            role_calls: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
            role_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn with_roles(mut self, admin: RoleScript, super_admin: RoleScript) -> Self {
        self.admin = admin;
        self.super_admin = super_admin;
        self
    }

    pub fn with_failing_exchange(mut self) -> Self {
        self.exchange_succeeds = false;
        self
    }

    pub fn remote_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst) + self.role_calls.load(Ordering::SeqCst)
    }
}

pub fn identity() -> Identity {
    Identity {
        id: Uuid::from_u128(0x5eed_cafe),
        email: Some("student@academy.test".to_string()),
    }
}

pub fn rotated_tokens() -> SessionTokens {
    SessionTokens {
        access_token: ROTATED_ACCESS.to_string(),
        refresh_token: ROTATED_REFRESH.to_string(),
        expires_in: Some(3600),
    }
}

#[async_trait]
impl SessionAuthority for ScriptedAuthority {
    async fn resolve_session(&self, credentials: &Credentials) -> Result<SessionLookup, AuthorityError> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);

        if credentials.is_empty() {
            return Ok(SessionLookup::anonymous());
        }

        match self.session {
            SessionScript::Anonymous => Ok(SessionLookup::anonymous()),
            SessionScript::Authenticated => Ok(SessionLookup::authenticated(identity())),
            SessionScript::Refreshed => Ok(SessionLookup::refreshed(identity(), rotated_tokens())),
            SessionScript::Expired => Ok(SessionLookup::expired()),
            SessionScript::Fails => Err(AuthorityError::Rejected {
                status: 503,
                message: "auth service unavailable".to_string(),
            }),
            SessionScript::Hangs => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(SessionLookup::authenticated(identity()))
            }
        }
    }

    async fn exchange_code(&self, code: &str, _verifier: Option<&str>) -> Result<IssuedSession, AuthorityError> {
        if self.exchange_succeeds && code == "good-code" {
            Ok(IssuedSession { identity: identity(), tokens: rotated_tokens() })
        } else {
            Err(AuthorityError::Rejected { status: 400, message: "invalid_grant".to_string() })
        }
    }

    async fn sign_out(&self, _credentials: &Credentials) -> Result<(), AuthorityError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl RoleAuthority for ScriptedAuthority {
    async fn has_role(&self, session: &Credentials, role: Role) -> Result<bool, AuthorityError> {
        self.role_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &session.access_token {
            self.role_tokens.lock().unwrap().push(token.clone());
        }

        let script = match role {
            Role::Admin => self.admin,
            Role::SuperAdmin => self.super_admin,
        };
        match script {
            RoleScript::Granted => Ok(true),
            RoleScript::Denied => Ok(false),
            RoleScript::Fails => Err(AuthorityError::Malformed("not a boolean".to_string())),
            RoleScript::Hangs => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(true)
            }
        }
    }
}

pub fn settings() -> GateSettings {
    GateSettings {
        session_timeout: Duration::from_millis(200),
        role_timeout: Duration::from_millis(200),
        on_internal_failure: RootFailurePolicy::FailClosed,
        ..GateSettings::default()
    }
}

pub fn gate(authority: &Arc<ScriptedAuthority>) -> Gate {
    Gate::new(RoutePolicy::academy(), authority.clone(), authority.clone(), settings())
}

pub fn cookie_settings() -> CookieSettings {
    CookieSettings {
        access_name: "sb-access-token".to_string(),
        refresh_name: "sb-refresh-token".to_string(),
        verifier_name: "sb-code-verifier".to_string(),
        secure: false,
    }
}

pub fn state(authority: &Arc<ScriptedAuthority>) -> AppState {
    AppState::new(Arc::new(gate(authority)), authority.clone(), cookie_settings())
}

/// Stand-in pages behind the gate
pub fn gated_router(state: AppState) -> Router {
    Router::new()
        .route("/profile", get(|| async { "profile" }))
        .route("/admin/reports", get(|| async { "reports" }))
        .route("/api/webhooks/stripe", get(|| async { "webhook" }))
        .layer(middleware::from_fn_with_state(state, gate_middleware))
}

pub fn request(method: &str, path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn credentials() -> Credentials {
    Credentials::new(Some("valid-access".to_string()), Some("valid-refresh".to_string()))
}
