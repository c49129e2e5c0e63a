use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::gate::RouteDecision;
use crate::state::AppState;

/// Authorization gate middleware, run on every request before routing.
///
/// On `Allow` the resolved `Identity` and `PrivilegeFlags` are injected into
/// the request extensions. Tokens rotated by the authority are written back
/// as cookies on both pass-through and redirect responses; credentials the
/// authority declared dead are cleared.
pub async fn gate_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let credentials = state.cookies.credentials(&jar);

    let outcome = state.gate.evaluate(&path, &credentials).await;

    let jar = match &outcome.refreshed {
        Some(tokens) => state.cookies.store(jar, tokens),
        None if outcome.session_expired => state.cookies.clear(jar),
        None => jar,
    };

    match outcome.decision {
        RouteDecision::Allow => {
            if let Some(identity) = outcome.identity {
                request.extensions_mut().insert(identity);
            }
            if let Some(privileges) = outcome.privileges {
                request.extensions_mut().insert(privileges);
            }

            let response = next.run(request).await;
            (jar, response).into_response()
        }
        RouteDecision::Redirect(target) => {
            let location = state.gate.settings().location(&target);
            tracing::info!("Redirecting {} request for '{}' to '{}'", outcome.route, path, location);
            (jar, Redirect::temporary(&location)).into_response()
        }
    }
}
