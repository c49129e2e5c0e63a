// handlers/elevated/admin.rs - GET /admin/session handler

use axum::Extension;
use serde::Serialize;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::gate::PrivilegeFlags;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct AdminSession {
    pub identity: Identity,
    pub privileges: PrivilegeFlags,
}

/// GET /admin/session - Identity and privilege tiers of the current admin
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "identity": { "id": "user_uuid", "email": "admin@example.com" },
///     "privileges": { "is_admin": true, "is_super_admin": false }
///   }
/// }
/// ```
pub async fn admin_session(
    identity: Option<Extension<Identity>>,
    privileges: Option<Extension<PrivilegeFlags>>,
) -> ApiResult<AdminSession> {
    let Extension(identity) =
        identity.ok_or_else(|| ApiError::unauthorized("Authorization gate did not resolve a session"))?;

    // Only reachable without flags if the gate failed open
    let privileges = match privileges {
        Some(Extension(flags)) if flags.any() => flags,
        _ => return Err(ApiError::forbidden("Administrator access required")),
    };

    Ok(ApiResponse::success(AdminSession { identity, privileges }))
}
