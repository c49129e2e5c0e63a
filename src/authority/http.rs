use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use url::Url;
use uuid::Uuid;

use super::{AuthorityError, IssuedSession, Role, RoleAuthority, SessionAuthority, SessionLookup};
use crate::auth::{access_token_is_stale, Credentials, Identity, SessionTokens};
use crate::config::AuthorityConfig;

/// Longest slice of an authority error body kept in `AuthorityError::Rejected`
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserPayload> for Identity {
    fn from(user: UserPayload) -> Self {
        Identity { id: user.id, email: user.email }
    }
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    user: UserPayload,
}

impl From<TokenPayload> for IssuedSession {
    fn from(payload: TokenPayload) -> Self {
        IssuedSession {
            identity: payload.user.into(),
            tokens: SessionTokens {
                access_token: payload.access_token,
                refresh_token: payload.refresh_token,
                expires_in: payload.expires_in,
            },
        }
    }
}

/// Client for a Supabase-compatible authority: GoTrue for sessions, PostgREST
/// RPC for role checks
#[derive(Clone)]
pub struct HttpAuthority {
    client: Client,
    base_url: Url,
    anon_key: String,
}

impl std::fmt::Debug for HttpAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuthority")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl HttpAuthority {
    pub fn new(config: &AuthorityConfig) -> Result<Self, AuthorityError> {
        let mut base_url = Url::parse(&config.url)
            .map_err(|e| AuthorityError::Configuration(format!("invalid authority url '{}': {}", config.url, e)))?;

        // Endpoints are joined relative to the base, which needs a trailing slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url,
            anon_key: config.anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthorityError> {
        self.base_url
            .join(path)
            .map_err(|e| AuthorityError::Configuration(format!("cannot build endpoint '{}': {}", path, e)))
    }

    fn token_endpoint(&self, grant_type: &str) -> Result<Url, AuthorityError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }

    /// Look up the user behind an access token; `None` when the authority
    /// refuses the token
    async fn fetch_user(&self, access_token: &str) -> Result<Option<Identity>, AuthorityError> {
        let response = self
            .client
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let user: UserPayload = response
                    .json()
                    .await
                    .map_err(|e| AuthorityError::Malformed(format!("user payload: {}", e)))?;
                Ok(Some(user.into()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(rejected(response).await),
        }
    }

    async fn grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Response, AuthorityError> {
        let response = self
            .client
            .post(self.token_endpoint(grant_type)?)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;
        Ok(response)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionLookup, AuthorityError> {
        let response = self
            .grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;

        match response.status() {
            status if status.is_success() => {
                let payload: TokenPayload = response
                    .json()
                    .await
                    .map_err(|e| AuthorityError::Malformed(format!("token payload: {}", e)))?;
                let issued = IssuedSession::from(payload);
                tracing::debug!("Refreshed session for user {}", issued.identity.id);
                Ok(SessionLookup::refreshed(issued.identity, issued.tokens))
            }
            // Revoked or already-used refresh token: the session is gone
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                tracing::debug!("Refresh token rejected with {}, session expired", response.status());
                Ok(SessionLookup::expired())
            }
            _ => Err(rejected(response).await),
        }
    }

    /// The access token is unusable: refresh if possible, otherwise the session is over
    async fn refresh_or_expire(&self, refresh_token: Option<&str>) -> Result<SessionLookup, AuthorityError> {
        match refresh_token {
            Some(token) => self.refresh(token).await,
            None => Ok(SessionLookup::expired()),
        }
    }
}

#[async_trait]
impl SessionAuthority for HttpAuthority {
    async fn resolve_session(&self, credentials: &Credentials) -> Result<SessionLookup, AuthorityError> {
        let refresh_token = credentials.refresh_token.as_deref();

        let Some(access_token) = credentials.access_token.as_deref() else {
            return match refresh_token {
                Some(token) => self.refresh(token).await,
                None => Ok(SessionLookup::anonymous()),
            };
        };

        if access_token_is_stale(access_token) {
            return self.refresh_or_expire(refresh_token).await;
        }

        match self.fetch_user(access_token).await? {
            Some(identity) => Ok(SessionLookup::authenticated(identity)),
            None => self.refresh_or_expire(refresh_token).await,
        }
    }

    async fn exchange_code(&self, code: &str, verifier: Option<&str>) -> Result<IssuedSession, AuthorityError> {
        let response = self
            .grant("pkce", json!({ "auth_code": code, "code_verifier": verifier }))
            .await?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let payload: TokenPayload = response
            .json()
            .await
            .map_err(|e| AuthorityError::Malformed(format!("token payload: {}", e)))?;
        Ok(payload.into())
    }

    async fn sign_out(&self, credentials: &Credentials) -> Result<(), AuthorityError> {
        let Some(access_token) = credentials.access_token.as_deref() else {
            return Ok(());
        };

        let response = self
            .client
            .post(self.endpoint("auth/v1/logout")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // Already signed out
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(rejected(response).await),
        }
    }
}

#[async_trait]
impl RoleAuthority for HttpAuthority {
    async fn has_role(&self, session: &Credentials, role: Role) -> Result<bool, AuthorityError> {
        let access_token = session
            .access_token
            .as_deref()
            .ok_or(AuthorityError::MissingCredentials)?;

        let response = self
            .client
            .post(self.endpoint(&format!("rest/v1/rpc/{}", role.rpc_name()))?)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .json(&json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        response
            .json::<bool>()
            .await
            .map_err(|e| AuthorityError::Malformed(format!("{} result: {}", role.rpc_name(), e)))
    }
}

async fn rejected(response: Response) -> AuthorityError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    AuthorityError::Rejected {
        status,
        message: body.chars().take(MAX_ERROR_BODY).collect(),
    }
}
