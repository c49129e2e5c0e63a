// handlers/public/auth/callback.rs - GET /auth/callback handler

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use url::Url;

use crate::authority::AuthorityError;
use crate::gate::RedirectTarget;
use crate::state::AppState;

/// Placeholder origin `next` is resolved against; never sent anywhere
const SAME_SITE_BASE: &str = "http://academy.invalid/";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    /// Where to land after sign-in; same-site paths only
    pub next: Option<String>,
    /// Set by the provider when the user aborted or the link expired
    pub error_description: Option<String>,
}

/// GET /auth/callback?code=...&next=... - Complete a sign-in
///
/// Exchanges the authorization code (with the PKCE verifier cookie) for a
/// session, stores the tokens as cookies and redirects to `next`. Any failure
/// lands on the auth-error page with a reason the user can read.
pub async fn auth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let settings = state.gate.settings();

    if let Some(description) = params.error_description {
        tracing::warn!("Auth callback carried a provider error: {}", description);
        return auth_error(&state, jar, description);
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return auth_error(&state, jar, "The sign-in link is missing its authorization code");
    };

    let verifier = state.cookies.code_verifier(&jar);
    let exchange = state.sessions.exchange_code(&code, verifier.as_deref());
    let result = match tokio::time::timeout(settings.session_timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(AuthorityError::Timeout(settings.session_timeout)),
    };

    match result {
        Ok(session) => {
            tracing::info!("Session established for user {}", session.identity.id);
            let jar = state.cookies.store(jar, &session.tokens);
            let jar = state.cookies.clear_verifier(jar);
            let destination =
                same_site_path(params.next.as_deref()).unwrap_or_else(|| settings.home_path.clone());
            (jar, Redirect::temporary(&destination)).into_response()
        }
        Err(e) => {
            tracing::warn!("Authorization code exchange failed: {}", e);
            auth_error(&state, jar, "The sign-in link is invalid or has expired")
        }
    }
}

fn auth_error(state: &AppState, jar: CookieJar, reason: impl Into<String>) -> Response {
    let target = RedirectTarget::AuthError { reason: reason.into() };
    let location = state.gate.settings().location(&target);
    (state.cookies.clear_verifier(jar), Redirect::temporary(&location)).into_response()
}

/// Accept only paths on this site, so the callback cannot be used as an open redirect.
///
/// The value is resolved against a fixed origin and must stay on it; only the
/// normalized path and query are kept. Control characters and whitespace are
/// refused outright: browsers strip them from a Location before resolving it.
fn same_site_path(next: Option<&str>) -> Option<String> {
    let next = next?;
    if !next.starts_with('/') || next.chars().any(|c| c.is_control() || c.is_whitespace() || c == '\\') {
        return None;
    }

    let base = Url::parse(SAME_SITE_BASE).ok()?;
    let resolved = base.join(next).ok()?;
    if resolved.origin() != base.origin() {
        return None;
    }

    let mut path = resolved.path().to_string();
    if let Some(query) = resolved.query() {
        path.push('?');
        path.push_str(query);
    }
    Some(path)
}
