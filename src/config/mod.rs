use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub authority: AuthorityConfig,
    pub gate: GateConfig,
    pub cookies: CookieConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityConfig {
    pub url: String,
    pub anon_key: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    pub session_timeout_ms: u64,
    pub role_timeout_ms: u64,
    pub fail_open: bool,
    pub sign_in_path: String,
    pub home_path: String,
    pub auth_error_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    pub access_name: String,
    pub refresh_name: String,
    pub verifier_name: String,
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("GATE_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }

        // Authority overrides
        if let Ok(v) = env::var("AUTHORITY_URL") {
            self.authority.url = v;
        }
        if let Ok(v) = env::var("AUTHORITY_ANON_KEY") {
            self.authority.anon_key = v;
        }
        if let Ok(v) = env::var("AUTHORITY_REQUEST_TIMEOUT_MS") {
            self.authority.request_timeout_ms = v.parse().unwrap_or(self.authority.request_timeout_ms);
        }

        // Gate overrides
        if let Ok(v) = env::var("GATE_SESSION_TIMEOUT_MS") {
            self.gate.session_timeout_ms = v.parse().unwrap_or(self.gate.session_timeout_ms);
        }
        if let Ok(v) = env::var("GATE_ROLE_TIMEOUT_MS") {
            self.gate.role_timeout_ms = v.parse().unwrap_or(self.gate.role_timeout_ms);
        }
        if let Ok(v) = env::var("GATE_FAIL_OPEN") {
            self.gate.fail_open = v.parse().unwrap_or(self.gate.fail_open);
        }
        if let Ok(v) = env::var("GATE_SIGN_IN_PATH") {
            self.gate.sign_in_path = v;
        }
        if let Ok(v) = env::var("GATE_HOME_PATH") {
            self.gate.home_path = v;
        }
        if let Ok(v) = env::var("GATE_AUTH_ERROR_PATH") {
            self.gate.auth_error_path = v;
        }

        // Cookie overrides
        if let Ok(v) = env::var("COOKIE_ACCESS_NAME") {
            self.cookies.access_name = v;
        }
        if let Ok(v) = env::var("COOKIE_REFRESH_NAME") {
            self.cookies.refresh_name = v;
        }
        if let Ok(v) = env::var("COOKIE_VERIFIER_NAME") {
            self.cookies.verifier_name = v;
        }
        if let Ok(v) = env::var("COOKIE_SECURE") {
            self.cookies.secure = v.parse().unwrap_or(self.cookies.secure);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    fn gate_defaults(timeout_ms: u64) -> GateConfig {
        GateConfig {
            session_timeout_ms: timeout_ms,
            role_timeout_ms: timeout_ms,
            fail_open: false,
            sign_in_path: "/auth/signin".to_string(),
            home_path: "/".to_string(),
            auth_error_path: "/auth/auth-code-error".to_string(),
        }
    }

    fn cookie_defaults(secure: bool) -> CookieConfig {
        CookieConfig {
            access_name: "sb-access-token".to_string(),
            refresh_name: "sb-refresh-token".to_string(),
            verifier_name: "sb-code-verifier".to_string(),
            secure,
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            authority: AuthorityConfig {
                url: "http://127.0.0.1:54321".to_string(),
                anon_key: String::new(),
                request_timeout_ms: 10_000,
            },
            gate: Self::gate_defaults(5_000),
            cookies: Self::cookie_defaults(false),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 8080 },
            authority: AuthorityConfig {
                url: "https://staging-auth.persuasion.academy".to_string(),
                anon_key: String::new(),
                request_timeout_ms: 5_000,
            },
            gate: Self::gate_defaults(3_000),
            cookies: Self::cookie_defaults(true),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.persuasion.academy".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 8080 },
            authority: AuthorityConfig {
                url: "https://auth.persuasion.academy".to_string(),
                anon_key: String::new(),
                request_timeout_ms: 5_000,
            },
            gate: Self::gate_defaults(3_000),
            cookies: Self::cookie_defaults(true),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://persuasion.academy".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
