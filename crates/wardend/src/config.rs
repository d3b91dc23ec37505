//! Daemon configuration.
//!
//! Loaded from a TOML file (path via `WARDEN_CONFIG`, falling back to
//! `/etc/warden/config.toml`); every field has a default so an absent
//! file yields a working daemon with an empty fleet.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use warden_common::WardenError;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/warden/config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Seconds between drift-scan ticks.
    pub scan_interval_secs: u64,
    /// Hard timeout for one live-spec fetch.
    pub fetch_timeout_secs: u64,
    /// Hard timeout for one pipeline submission.
    pub dispatch_timeout_secs: u64,
    pub escalation: EscalationConfig,
    /// Fleet seeds; the registry starts from these.
    #[serde(rename = "integration")]
    pub integrations: Vec<IntegrationSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Failure rate above which an integration escalates.
    pub critical_failure_rate: f64,
    /// Escalation needs more calls than this; guards against a single
    /// early failure paging anyone.
    pub min_sample: u64,
    /// Health score below which an integration is listed as critical.
    pub critical_score: f64,
}

/// One integration as declared in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationSeed {
    pub id: String,
    pub live_spec_url: Option<String>,
    /// Path to the stored baseline spec on disk.
    pub baseline_path: Option<String>,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 3600,
            fetch_timeout_secs: 30,
            dispatch_timeout_secs: 10,
            escalation: EscalationConfig::default(),
            integrations: Vec::new(),
        }
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            critical_failure_rate: 0.5,
            min_sample: 5,
            critical_score: 60.0,
        }
    }
}

impl WardenConfig {
    /// Load from `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, WardenError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| WardenError::Config(e.to_string()))
    }

    /// Resolve the config path from the environment.
    pub fn resolve_path() -> std::path::PathBuf {
        std::env::var("WARDEN_CONFIG")
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|_| std::path::PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }
}
