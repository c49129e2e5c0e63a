// handlers/protected/whoami.rs - GET /api/me handler

use axum::Extension;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/me - Identity behind the current session
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": { "id": "user_uuid", "email": "student@example.com" }
/// }
/// ```
pub async fn whoami(identity: Option<Extension<Identity>>) -> ApiResult<Identity> {
    let Extension(identity) =
        identity.ok_or_else(|| ApiError::unauthorized("Authorization gate did not resolve a session"))?;
    Ok(ApiResponse::success(identity))
}
