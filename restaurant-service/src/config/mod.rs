use service_core::config::{self as core_config, get_env};
use service_core::error::AppError;
use std::env;
use std::time::Duration;

use crate::services::UpdateMode;

#[derive(Debug, Clone)]
pub struct RestaurantConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub storage: StorageBackend,
    /// Upper bound for one request, store calls included.
    pub request_timeout: Duration,
    pub update_mode: UpdateMode,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongodb,
    Memory,
}

impl StorageBackend {
    pub fn from_string(s: &str) -> Result<Self, AppError> {
        match s {
            "mongodb" => Ok(StorageBackend::Mongodb),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "STORAGE_BACKEND must be 'mongodb' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

impl RestaurantConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = core_config::is_prod();

        let storage = StorageBackend::from_string(&get_env(
            "STORAGE_BACKEND",
            Some("mongodb"),
            false,
        )?)?;

        // The in-memory backend never talks to MongoDB.
        let mongo_required = is_prod && storage == StorageBackend::Mongodb;

        Ok(RestaurantConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env(
                    "MONGODB_URI",
                    Some("mongodb://localhost:27017"),
                    mongo_required,
                )?,
                database: get_env("MONGODB_DATABASE", Some("restaurant"), mongo_required)?,
            },
            storage,
            request_timeout: parse_timeout(&get_env("REQUEST_TIMEOUT_SECS", Some("100"), false)?)?,
            update_mode: parse_update_mode(&get_env("UPDATE_MODE", Some("upsert"), false)?)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn parse_timeout(value: &str) -> Result<Duration, AppError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "REQUEST_TIMEOUT_SECS must be a positive number of seconds, got '{}'",
            value
        ))),
    }
}

fn parse_update_mode(value: &str) -> Result<UpdateMode, AppError> {
    UpdateMode::from_string(value).ok_or_else(|| {
        AppError::ConfigError(anyhow::anyhow!(
            "UPDATE_MODE must be 'upsert' or 'update_only', got '{}'",
            value
        ))
    })
}
