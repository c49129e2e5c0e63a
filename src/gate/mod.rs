//! Request authorization gate.
//!
//! Evaluated once per inbound request before any handler runs:
//!
//! 1. the path is classified locally ([`route`]); public paths are allowed
//!    without contacting the authority
//! 2. the session is resolved ([`session`]); no session means sign-in
//! 3. privileged paths additionally need admin or super-admin ([`roles`]),
//!    otherwise the visitor is sent home
//!
//! Resolution and role failures are absorbed where they happen. A panic in
//! either step is caught at the root and handled per [`RootFailurePolicy`].

pub mod roles;
pub mod route;
pub mod session;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::auth::{Credentials, Identity, SessionTokens};
use crate::authority::{RoleAuthority, SessionAuthority, SessionLookup};
use crate::config::GateConfig;

pub use roles::{classify_privileges, PrivilegeFlags, RoleCheck};
pub use route::{RouteClass, RoutePattern, RoutePolicy, RouteRule};
pub use session::resolve_session;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectTarget {
    SignIn,
    Home,
    /// Auth error page, with a human-readable reason
    AuthError { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    Redirect(RedirectTarget),
}

/// What to do when the gate itself breaks on a non-public path
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootFailurePolicy {
    /// Let the request through (legacy behaviour)
    FailOpen,
    /// Send the visitor to sign-in
    FailClosed,
}

#[derive(Clone, Debug)]
pub struct GateSettings {
    pub session_timeout: Duration,
    pub role_timeout: Duration,
    pub on_internal_failure: RootFailurePolicy,
    pub sign_in_path: String,
    pub home_path: String,
    pub auth_error_path: String,
}

impl GateSettings {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            session_timeout: Duration::from_millis(config.session_timeout_ms),
            role_timeout: Duration::from_millis(config.role_timeout_ms),
            on_internal_failure: if config.fail_open {
                RootFailurePolicy::FailOpen
            } else {
                RootFailurePolicy::FailClosed
            },
            sign_in_path: config.sign_in_path.clone(),
            home_path: config.home_path.clone(),
            auth_error_path: config.auth_error_path.clone(),
        }
    }

    /// Location header value for a redirect target
    pub fn location(&self, target: &RedirectTarget) -> String {
        match target {
            RedirectTarget::SignIn => self.sign_in_path.clone(),
            RedirectTarget::Home => self.home_path.clone(),
            RedirectTarget::AuthError { reason } => {
                let reason: String = url::form_urlencoded::byte_serialize(reason.as_bytes()).collect();
                format!("{}?reason={}", self.auth_error_path, reason)
            }
        }
    }
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(3),
            role_timeout: Duration::from_secs(3),
            on_internal_failure: RootFailurePolicy::FailClosed,
            sign_in_path: "/auth/signin".to_string(),
            home_path: "/".to_string(),
            auth_error_path: "/auth/auth-code-error".to_string(),
        }
    }
}

/// Everything the gate learned about one request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateOutcome {
    pub route: RouteClass,
    pub decision: RouteDecision,
    pub identity: Option<Identity>,
    pub privileges: Option<PrivilegeFlags>,
    /// Rotated tokens; must reach the response whatever the decision
    pub refreshed: Option<SessionTokens>,
    /// The presented credentials are dead and should be cleared
    pub session_expired: bool,
}

impl GateOutcome {
    fn new(route: RouteClass, decision: RouteDecision) -> Self {
        Self {
            route,
            decision,
            identity: None,
            privileges: None,
            refreshed: None,
            session_expired: false,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == RouteDecision::Allow
    }
}

pub struct Gate {
    routes: RoutePolicy,
    sessions: Arc<dyn SessionAuthority>,
    roles: Arc<dyn RoleAuthority>,
    settings: GateSettings,
}

impl Gate {
    pub fn new(
        routes: RoutePolicy,
        sessions: Arc<dyn SessionAuthority>,
        roles: Arc<dyn RoleAuthority>,
        settings: GateSettings,
    ) -> Self {
        Self { routes, sessions, roles, settings }
    }

    pub fn routes(&self) -> &RoutePolicy {
        &self.routes
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    /// Decide what happens to a request for `path` carrying `credentials`
    pub async fn evaluate(&self, path: &str, credentials: &Credentials) -> GateOutcome {
        let route = self.routes.classify(path);

        if route == RouteClass::Public {
            tracing::debug!("Gate: '{}' is public", path);
            return GateOutcome::new(route, RouteDecision::Allow);
        }

        match AssertUnwindSafe(self.check_session(route, credentials)).catch_unwind().await {
            Ok(outcome) => {
                tracing::debug!("Gate: '{}' ({}) -> {:?}", path, route, outcome.decision);
                outcome
            }
            Err(panic) => {
                tracing::error!(
                    "Gate failed internally on '{}' ({}), applying {:?}: {}",
                    path,
                    route,
                    self.settings.on_internal_failure,
                    panic_message(panic.as_ref())
                );
                let decision = match self.settings.on_internal_failure {
                    RootFailurePolicy::FailOpen => RouteDecision::Allow,
                    RootFailurePolicy::FailClosed => RouteDecision::Redirect(RedirectTarget::SignIn),
                };
                GateOutcome::new(route, decision)
            }
        }
    }

    async fn check_session(&self, route: RouteClass, credentials: &Credentials) -> GateOutcome {
        let SessionLookup { identity, refreshed, expired } =
            resolve_session(self.sessions.as_ref(), credentials, self.settings.session_timeout).await;

        let mut outcome = GateOutcome::new(route, RouteDecision::Allow);
        outcome.refreshed = refreshed;
        outcome.session_expired = expired;

        let Some(identity) = identity else {
            outcome.decision = RouteDecision::Redirect(RedirectTarget::SignIn);
            return outcome;
        };
        outcome.identity = Some(identity);

        if route != RouteClass::Privileged {
            return outcome;
        }

        // Role queries must use the rotated session when there is one
        let session = match &outcome.refreshed {
            Some(tokens) => credentials.rotated(tokens),
            None => credentials.clone(),
        };

        let privileges =
            classify_privileges(self.roles.as_ref(), &session, self.settings.role_timeout).await;
        if !privileges.any() {
            outcome.decision = RouteDecision::Redirect(RedirectTarget::Home);
        }
        outcome.privileges = Some(privileges);
        outcome
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
