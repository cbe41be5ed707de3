//! API route handlers.

pub mod auth_routes;
pub mod health;
