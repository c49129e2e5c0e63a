use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::{Credentials, SessionTokens};
use crate::config::CookieConfig;

/// Names and flags of the session cookies
#[derive(Clone, Debug)]
pub struct CookieSettings {
    pub access_name: String,
    pub refresh_name: String,
    pub verifier_name: String,
    pub secure: bool,
}

impl CookieSettings {
    pub fn from_config(config: &CookieConfig) -> Self {
        Self {
            access_name: config.access_name.clone(),
            refresh_name: config.refresh_name.clone(),
            verifier_name: config.verifier_name.clone(),
            secure: config.secure,
        }
    }

    /// Session credentials carried by the request
    pub fn credentials(&self, jar: &CookieJar) -> Credentials {
        Credentials::new(
            cookie_value(jar, &self.access_name),
            cookie_value(jar, &self.refresh_name),
        )
    }

    /// PKCE verifier stored when the sign-in flow started
    pub fn code_verifier(&self, jar: &CookieJar) -> Option<String> {
        cookie_value(jar, &self.verifier_name)
    }

    pub fn store(&self, jar: CookieJar, tokens: &SessionTokens) -> CookieJar {
        jar.add(self.session_cookie(&self.access_name, tokens.access_token.clone()))
            .add(self.session_cookie(&self.refresh_name, tokens.refresh_token.clone()))
    }

    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(self.removal(&self.access_name))
            .remove(self.removal(&self.refresh_name))
    }

    pub fn clear_verifier(&self, jar: CookieJar) -> CookieJar {
        jar.remove(self.removal(&self.verifier_name))
    }

    fn session_cookie(&self, name: &str, value: String) -> Cookie<'static> {
        Cookie::build((name.to_string(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build()
    }

    // Removal only matches when the path is the same as when it was set
    fn removal(&self, name: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), String::new())).path("/").build()
    }
}

fn cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
