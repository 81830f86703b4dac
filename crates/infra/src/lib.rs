//! Infrastructure layer: event stores, the analytics engine, configuration.

pub mod config;
pub mod engine;
pub mod event_store;
