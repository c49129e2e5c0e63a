pub mod cookies;
pub mod gate;
pub mod response;

pub use cookies::CookieSettings;
pub use gate::gate_middleware;
pub use response::{ApiResponse, ApiResult};
