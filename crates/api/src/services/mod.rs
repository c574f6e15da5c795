//! Supporting services for route handlers.

pub mod auth;
pub mod uploads;
