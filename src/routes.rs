use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SecurityConfig;
use crate::handlers::{self, elevated, protected, public};
use crate::middleware::gate_middleware;
use crate::state::AppState;

/// The full application: every route, including the fallback, sits behind the gate
pub fn app(state: AppState, security: &SecurityConfig) -> Router {
    Router::new()
        .merge(public_routes())
        .merge(protected_routes())
        .merge(elevated_routes())
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), gate_middleware))
        .layer(cors_layer(security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/public/health", get(public::health))
        .route("/auth/callback", get(public::auth::auth_callback))
        .route("/auth/signout", post(public::auth::sign_out))
}

fn protected_routes() -> Router<AppState> {
    Router::new().route("/api/me", get(protected::whoami))
}

fn elevated_routes() -> Router<AppState> {
    Router::new().route("/admin/session", get(elevated::admin_session))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    // Session cookies need credentialed CORS, which rules out wildcards
    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
