//! Runtime configuration, loaded from the environment and reloadable.

use std::net::SocketAddr;
use std::sync::RwLock;

use thiserror::Error;

pub const ENV_BIND_ADDR: &str = "CODECAMP_BIND_ADDR";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_SEED_DATA: &str = "CODECAMP_SEED_DATA";
pub const ENV_DEFAULT_API_VERSION: &str = "CODECAMP_DEFAULT_API_VERSION";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_API_VERSION: &str = "1.1";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("configuration lock poisoned")]
    Poisoned,
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// When set (and the `postgres` feature is on) the Postgres store is used.
    pub database_url: Option<String>,
    /// Preload the demo dataset into the in-memory store.
    pub seed_data: bool,
    /// `major.minor` version assumed when a request names none.
    pub default_api_version: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source (the environment in
    /// production, a map in tests). Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get(ENV_BIND_ADDR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid(ENV_BIND_ADDR, e.to_string()))?;

        let seed_data = match get(ENV_SEED_DATA) {
            None => true,
            Some(v) => parse_bool(&v).ok_or_else(|| {
                ConfigError::invalid(ENV_SEED_DATA, format!("expected true/false, got '{v}'"))
            })?,
        };

        let default_api_version =
            get(ENV_DEFAULT_API_VERSION).unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        if !is_major_minor(&default_api_version) {
            return Err(ConfigError::invalid(
                ENV_DEFAULT_API_VERSION,
                format!("expected major.minor, got '{default_api_version}'"),
            ));
        }

        Ok(Self {
            bind_addr,
            database_url: get(ENV_DATABASE_URL),
            seed_data,
            default_api_version,
        })
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn is_major_minor(v: &str) -> bool {
    match v.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.bytes().all(|b| b.is_ascii_digit())
                && minor.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

type Loader = Box<dyn Fn() -> Result<AppConfig, ConfigError> + Send + Sync>;

/// Shared, reloadable configuration.
pub struct ConfigHandle {
    current: RwLock<AppConfig>,
    loader: Loader,
}

impl ConfigHandle {
    pub fn new(
        initial: AppConfig,
        loader: impl Fn() -> Result<AppConfig, ConfigError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            current: RwLock::new(initial),
            loader: Box::new(loader),
        }
    }

    /// Load from the environment now, and again on every reload.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(AppConfig::from_env()?, AppConfig::from_env))
    }

    /// A handle whose reload always yields the same config.
    pub fn fixed(config: AppConfig) -> Self {
        let reloaded = config.clone();
        Self::new(config, move || Ok(reloaded.clone()))
    }

    pub fn current(&self) -> Result<AppConfig, ConfigError> {
        self.current
            .read()
            .map(|c| c.clone())
            .map_err(|_| ConfigError::Poisoned)
    }

    /// Re-run the loader and swap the result in. On error the previous
    /// config stays in place.
    pub fn reload(&self) -> Result<AppConfig, ConfigError> {
        let fresh = (self.loader)()?;
        let mut current = self.current.write().map_err(|_| ConfigError::Poisoned)?;
        *current = fresh.clone();
        tracing::info!(
            bind_addr = %fresh.bind_addr,
            seed_data = fresh.seed_data,
            default_api_version = %fresh.default_api_version,
            "configuration reloaded"
        );
        Ok(fresh)
    }
}

impl core::fmt::Debug for ConfigHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
