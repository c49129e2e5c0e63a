use std::time::Duration;

use crate::auth::Credentials;
use crate::authority::{AuthorityError, SessionAuthority, SessionLookup};

/// Resolve the request's session. Never fails: any authority error or a
/// timeout leaves the request unauthenticated.
pub async fn resolve_session(
    authority: &dyn SessionAuthority,
    credentials: &Credentials,
    timeout: Duration,
) -> SessionLookup {
    let result = match tokio::time::timeout(timeout, authority.resolve_session(credentials)).await {
        Ok(result) => result,
        Err(_) => Err(AuthorityError::Timeout(timeout)),
    };

    match result {
        Ok(lookup) => lookup,
        Err(e) => {
            tracing::warn!("Session resolution failed, treating request as unauthenticated: {}", e);
            SessionLookup::anonymous()
        }
    }
}
