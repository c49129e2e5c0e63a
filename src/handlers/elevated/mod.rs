// handlers/elevated/mod.rs - Elevated handlers (admin or super-admin required)
//
// Route Prefix: /admin/*
// The gate only lets a request through here after both role checks settled
// and at least one came back granted; `PrivilegeFlags` is in the extensions.

pub mod admin;

pub use admin::admin_session;
