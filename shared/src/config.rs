use std::env;

use crate::error::ConfigError;
use crate::webhook::DEFAULT_TOLERANCE_SECS;

const DEFAULT_TABLE_NAME: &str = "identity-sync-users";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Dynamo,
    Memory,
}

/// Process-wide settings, read once at cold start
#[derive(Clone)]
pub struct Config {
    pub webhook_secret: String,
    pub data_api_url: String,
    pub table_name: String,
    pub webhook_tolerance_secs: i64,
    pub store_backend: StoreBackend,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // An absent secret is kept as "" so every delivery fails verification
        let webhook_secret = lookup("CLERK_WEBHOOK_SECRET").unwrap_or_default();
        if webhook_secret.is_empty() {
            tracing::warn!("CLERK_WEBHOOK_SECRET is not set");
        }

        let data_api_url = lookup("DATA_API_URL")
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("DATA_API_URL"))?;

        let table_name = lookup("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());

        let webhook_tolerance_secs = match lookup("WEBHOOK_TOLERANCE_SECS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("WEBHOOK_TOLERANCE_SECS", raw))?,
            None => DEFAULT_TOLERANCE_SECS,
        };
        if webhook_tolerance_secs < 0 {
            return Err(ConfigError::Negative("WEBHOOK_TOLERANCE_SECS", webhook_tolerance_secs));
        }

        let store_backend = match lookup("USER_STORE").as_deref() {
            Some("memory") => StoreBackend::Memory,
            _ => StoreBackend::Dynamo,
        };

        Ok(Self {
            webhook_secret,
            data_api_url,
            table_name,
            webhook_tolerance_secs,
            store_backend,
        })
    }
}
