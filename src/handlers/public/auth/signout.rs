// handlers/public/auth/signout.rs - POST /auth/signout handler

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::gate::RedirectTarget;
use crate::state::AppState;

/// POST /auth/signout - End the session
///
/// Revocation at the authority is best effort; the cookies are cleared and
/// the visitor is sent to sign-in either way.
pub async fn sign_out(State(state): State<AppState>, jar: CookieJar) -> Response {
    let credentials = state.cookies.credentials(&jar);

    if !credentials.is_empty() {
        let timeout = state.gate.settings().session_timeout;
        match tokio::time::timeout(timeout, state.sessions.sign_out(&credentials)).await {
            Ok(Ok(())) => tracing::debug!("Session revoked at the authority"),
            Ok(Err(e)) => tracing::warn!("Sign-out at the authority failed: {}", e),
            Err(_) => tracing::warn!("Sign-out at the authority timed out after {:?}", timeout),
        }
    }

    let location = state.gate.settings().location(&RedirectTarget::SignIn);
    (state.cookies.clear(jar), Redirect::to(&location)).into_response()
}
