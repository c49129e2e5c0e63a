pub mod auth;
pub mod authority;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
