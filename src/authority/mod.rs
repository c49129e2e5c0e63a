//! Collaborator contracts for the remote authentication/authorization authority.

pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::{Credentials, Identity, SessionTokens};

pub use http::HttpAuthority;

#[derive(Debug, thiserror::Error)]
pub enum AuthorityError {
    #[error("authority transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("authority rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("malformed authority response: {0}")]
    Malformed(String),
    #[error("authority call timed out after {0:?}")]
    Timeout(Duration),
    #[error("no session credentials available")]
    MissingCredentials,
    #[error("invalid authority configuration: {0}")]
    Configuration(String),
}

/// Result of a session lookup: who the request belongs to, and any tokens the
/// authority rotated while finding out
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionLookup {
    pub identity: Option<Identity>,
    pub refreshed: Option<SessionTokens>,
    /// The authority refused the credentials for good; they should be dropped
    pub expired: bool,
}

impl SessionLookup {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Credentials were presented but the session behind them is gone
    pub fn expired() -> Self {
        Self { expired: true, ..Self::default() }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self { identity: Some(identity), ..Self::default() }
    }

    pub fn refreshed(identity: Identity, tokens: SessionTokens) -> Self {
        Self { identity: Some(identity), refreshed: Some(tokens), expired: false }
    }
}

/// A session freshly issued by the authority (auth callback)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedSession {
    pub identity: Identity,
    pub tokens: SessionTokens,
}

/// Elevated privilege tiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    SuperAdmin,
}

impl Role {
    /// Name of the database function answering for this role
    pub fn rpc_name(self) -> &'static str {
        match self {
            Role::Admin => "is_admin",
            Role::SuperAdmin => "is_super_admin",
        }
    }
}

#[async_trait]
pub trait SessionAuthority: Send + Sync {
    /// Resolve the session behind the request credentials, refreshing if needed
    async fn resolve_session(&self, credentials: &Credentials) -> Result<SessionLookup, AuthorityError>;

    /// Trade an auth-callback code for a new session
    async fn exchange_code(&self, code: &str, verifier: Option<&str>) -> Result<IssuedSession, AuthorityError>;

    async fn sign_out(&self, credentials: &Credentials) -> Result<(), AuthorityError>;
}

#[async_trait]
pub trait RoleAuthority: Send + Sync {
    async fn has_role(&self, session: &Credentials, role: Role) -> Result<bool, AuthorityError>;
}
