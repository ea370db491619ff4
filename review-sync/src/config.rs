//! Runtime configuration loaded via OrthoConfig.
//!
//! Raw [`SyncSettings`] come from the command line, `REVIEW_SYNC_*`
//! environment variables and configuration files. [`SyncSettings::validate`]
//! turns them into a typed [`SyncConfig`].

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Configuration values controlling a reconciliation run.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "REVIEW_SYNC")]
pub struct SyncSettings {
    /// Base URL of the Zenodo instance, e.g. `https://zenodo.org`.
    pub zenodo_url: Option<String>,
    /// Base URL of the ORCID API host, e.g. `https://api.orcid.org`.
    pub orcid_url: Option<String>,
    /// Redis connection URL holding the credential records.
    pub redis_url: Option<String>,
    /// Per-request HTTP timeout.
    #[ortho_config(default = 30)]
    pub http_timeout_seconds: u64,
    /// Upper bound on concurrent profile writes for one reviewer.
    #[ortho_config(default = 4)]
    pub max_concurrent_writes: usize,
    /// Minimum spacing between Zenodo requests.
    #[ortho_config(default = 1500)]
    pub zenodo_interval_millis: u64,
    /// Maximum pooled Redis connections.
    #[ortho_config(default = 4)]
    pub redis_pool_size: u32,
}

/// Reasons settings cannot be turned into a [`SyncConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// A required setting was not provided.
    #[error("missing required setting {name}")]
    Missing { name: &'static str },
    /// A URL setting does not parse.
    #[error("setting {name} is not a valid URL: {message}")]
    InvalidUrl { name: &'static str, message: String },
    /// A numeric setting must be positive.
    #[error("setting {name} must be greater than zero")]
    NotPositive { name: &'static str },
}

/// Validated configuration for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub zenodo_url: Url,
    pub orcid_url: Url,
    pub redis_url: Url,
    pub http_timeout: Duration,
    pub max_concurrent_writes: usize,
    pub zenodo_interval: Duration,
    pub redis_pool_size: u32,
}

impl SyncSettings {
    /// Check every setting and produce a typed configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`SettingsError`] found, checking fields in
    /// declaration order.
    pub fn validate(&self) -> Result<SyncConfig, SettingsError> {
        Ok(SyncConfig {
            zenodo_url: required_url("zenodo_url", self.zenodo_url.as_deref())?,
            orcid_url: required_url("orcid_url", self.orcid_url.as_deref())?,
            redis_url: required_url("redis_url", self.redis_url.as_deref())?,
            http_timeout: Duration::from_secs(positive(
                "http_timeout_seconds",
                self.http_timeout_seconds,
            )?),
            max_concurrent_writes: positive("max_concurrent_writes", self.max_concurrent_writes)?,
            zenodo_interval: Duration::from_millis(positive(
                "zenodo_interval_millis",
                self.zenodo_interval_millis,
            )?),
            redis_pool_size: positive("redis_pool_size", self.redis_pool_size)?,
        })
    }
}

fn required_url(name: &'static str, value: Option<&str>) -> Result<Url, SettingsError> {
    let value = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(SettingsError::Missing { name })?;
    Url::parse(value).map_err(|err| SettingsError::InvalidUrl {
        name,
        message: err.to_string(),
    })
}

fn positive<T: Default + PartialEq>(name: &'static str, value: T) -> Result<T, SettingsError> {
    if value == T::default() {
        Err(SettingsError::NotPositive { name })
    } else {
        Ok(value)
    }
}
