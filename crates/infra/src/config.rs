//! Process configuration, read from environment variables.
//!
//! | Variable    | Required | Meaning                                           |
//! |-------------|----------|---------------------------------------------------|
//! | `API_AUTH`  | yes      | shared secret expected in the `Authorization` header |
//! | `MAX_AGE`   | yes      | partition retention in days (positive integer)   |
//! | `PORT`      | no       | listen port, default `8080`                       |
//! | `REDIS_URL` | no       | Redis connection URL; in-memory store when unset  |
//! | `REDIS_KEY` | no       | partition key prefix, default `analyticsEngine`   |
//!
//! Empty values are treated the same as unset ones.

use std::net::SocketAddr;

use thiserror::Error;

use crate::engine::EngineConfig;
use crate::event_store::RetentionDays;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub api_auth: String,
    pub redis_url: Option<String>,
    pub engine: EngineConfig,
}

impl Config {
    pub const DEFAULT_PORT: u16 = 8080;

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_auth = get("API_AUTH").ok_or(ConfigError::Missing("API_AUTH"))?;

        let raw_max_age = get("MAX_AGE").ok_or(ConfigError::Missing("MAX_AGE"))?;
        let max_age = raw_max_age
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(RetentionDays::new)
            .ok_or_else(|| ConfigError::Invalid {
                name: "MAX_AGE",
                message: format!("expected a positive number of days, got '{raw_max_age}'"),
            })?;

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                message: e.to_string(),
            })?,
            None => Self::DEFAULT_PORT,
        };

        let mut engine = EngineConfig::new(max_age);
        if let Some(prefix) = get("REDIS_KEY") {
            engine = engine.with_prefix(prefix);
        }

        Ok(Self {
            port,
            api_auth,
            redis_url: get("REDIS_URL"),
            engine,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
