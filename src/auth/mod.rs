use std::fmt;

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds before `exp` at which an access token is already treated as stale
pub const EXPIRY_LEEWAY_SECS: i64 = 10;

/// Session credential material carried by the request cookies
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.filter(|t| !t.is_empty()),
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }

    /// The session to use once the authority has rotated the tokens
    pub fn rotated(&self, tokens: &SessionTokens) -> Self {
        Self {
            access_token: Some(tokens.access_token.clone()),
            refresh_token: Some(tokens.refresh_token.clone()),
        }
    }
}

// Tokens never reach the logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Authenticated principal behind a request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Tokens issued by the authority on refresh or code exchange
#[derive(Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: Option<u64>,
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Claims carried by authority-issued access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Claims {
    pub fn is_expired(&self, leeway_secs: i64) -> bool {
        self.exp <= Utc::now().timestamp() + leeway_secs
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("unreadable access token: {0}")]
    Unreadable(#[from] jsonwebtoken::errors::Error),
}

/// Read the claims of an access token without verifying its signature.
///
/// The authority remains the only judge of validity; this is used to skip a
/// round trip when the token has visibly expired.
pub fn inspect_access_token(token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// True when the token carries an `exp` claim that has already passed
pub fn access_token_is_stale(token: &str) -> bool {
    match inspect_access_token(token) {
        Ok(claims) => claims.is_expired(EXPIRY_LEEWAY_SECS),
        Err(_) => false,
    }
}
