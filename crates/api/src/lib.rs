//! HTTP API: router, API-key middleware, and request/response mapping.

pub mod app;
pub mod middleware;
