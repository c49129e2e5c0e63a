// handlers/public/auth/mod.rs - Session establishment and teardown
//
// GET  /auth/callback - exchange the provider's code for a session
// POST /auth/signout  - end the session and clear cookies

pub mod callback;
pub mod signout;

pub use callback::auth_callback;
pub use signout::sign_out;
