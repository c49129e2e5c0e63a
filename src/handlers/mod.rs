// handlers/mod.rs - Handlers grouped by the gate tier that guards them
//
// Public (no session) → Protected (session required) → Elevated (admin or super-admin)
//
// The tier is decided by the gate's route table, not by where a handler lives;
// the layout mirrors the table so a route's guard is visible from its module.
pub mod public;    // /auth/*, /public/*
pub mod protected; // everything not listed in the route table
pub mod elevated;  // /admin/*

use axum::http::Uri;

use crate::error::ApiError;

/// Fallback for paths the gate let through but no handler serves
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for '{}'", uri.path()))
}
