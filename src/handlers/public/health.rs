// handlers/public/health.rs - GET /public/health handler

use serde_json::{json, Value};

use crate::middleware::ApiResponse;

/// GET /public/health - Liveness probe
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": { "status": "ok", "service": "academy-gate", "version": "0.1.0", "timestamp": "..." }
/// }
/// ```
pub async fn health() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    }))
}
