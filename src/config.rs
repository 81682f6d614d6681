//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::scheduler::SchedulerConfig;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub name: String,
    /// Full auto-refresh interval (the 30-minute cycle by default).
    pub refresh_interval_secs: u64,
    /// Symbols per remote call.
    pub chunk_size: usize,
    /// Wait between chunks within one cycle.
    pub chunk_delay_secs: u64,
    /// Quota backoff window.
    pub cooldown_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub api_key_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Snapshot file path; `None` falls back to the built-in default.
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// The scheduler pacing derived from this config.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            chunk_size: self.service.chunk_size,
            chunk_delay: Duration::from_secs(self.service.chunk_delay_secs),
            cooldown: Duration::from_secs(self.service.cooldown_secs),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.service.refresh_interval_secs)
    }
}
