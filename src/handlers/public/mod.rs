// handlers/public/mod.rs - Public handlers (no session required)
//
// Route Prefix: /auth/* and /public/*
// These paths are public in the gate's route table, so the authority is
// never consulted before they run.

pub mod auth;
pub mod health;

pub use health::health;
