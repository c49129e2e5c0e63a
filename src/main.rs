use anyhow::Context;
use tracing_subscriber::EnvFilter;

use academy_gate::{config, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up AUTHORITY_URL, AUTHORITY_ANON_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting academy gate in {:?} mode", config.environment);

    if config.authority.anon_key.is_empty() {
        tracing::warn!("AUTHORITY_ANON_KEY is not set; the authority will likely reject every call");
    }
    if config.gate.fail_open {
        tracing::warn!("GATE_FAIL_OPEN is set: internal gate failures will let requests through");
    }

    let state = AppState::from_config(config).context("failed to configure the authority client")?;
    let app = routes::app(state, &config.security);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Academy gate listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
