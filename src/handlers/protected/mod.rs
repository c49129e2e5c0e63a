// handlers/protected/mod.rs - Protected handlers (session required)
//
// Route Prefix: anything the route table does not list
// The gate has already resolved the session and injected the `Identity`
// extension by the time these run.

pub mod whoami;

pub use whoami::whoami;
