use std::sync::Arc;

use crate::authority::{AuthorityError, HttpAuthority, SessionAuthority};
use crate::config::AppConfig;
use crate::gate::{Gate, GateSettings, RoutePolicy};
use crate::middleware::CookieSettings;

/// Shared state handed to the gate middleware and the handlers
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<Gate>,
    pub sessions: Arc<dyn SessionAuthority>,
    pub cookies: CookieSettings,
}

impl AppState {
    pub fn new(gate: Arc<Gate>, sessions: Arc<dyn SessionAuthority>, cookies: CookieSettings) -> Self {
        Self { gate, sessions, cookies }
    }

    /// Wire the gate to the HTTP authority described by the configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, AuthorityError> {
        let authority = Arc::new(HttpAuthority::new(&config.authority)?);

        let gate = Gate::new(
            RoutePolicy::academy(),
            authority.clone(),
            authority.clone(),
            GateSettings::from_config(&config.gate),
        );

        Ok(Self::new(
            Arc::new(gate),
            authority,
            CookieSettings::from_config(&config.cookies),
        ))
    }
}
