//! # Sync Configuration
//!
//! Configuration for endpoints, time budgets, and the auto-sync interval.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     LIFEHUB_AUTH_URL=https://auth.example.com                          │
//! │     LIFEHUB_SYNC_INTERVAL_SECS=30                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/lifehub/sync.toml (Linux)                                │
//! │     ~/Library/Application Support/app.lifehub.lifehub/sync.toml (mac)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Timeout Nesting Invariant
//! The initializer's hard ceiling wraps the session check and the initial
//! data fetch. `validate()` refuses any configuration where an outer budget
//! does not exceed the sum of the inner budgets it wraps; an outer deadline
//! that fires first would discard still-useful in-flight work.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Endpoint Settings
// =============================================================================

/// Base URLs of the two consumed services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSettings {
    /// Auth service base URL.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Remote data service base URL.
    #[serde(default = "default_data_url")]
    pub data_url: String,
}

fn default_auth_url() -> String {
    "http://localhost:8090".to_string()
}

fn default_data_url() -> String {
    "http://localhost:8091".to_string()
}

impl Default for EndpointSettings {
    fn default() -> Self {
        EndpointSettings {
            auth_url: default_auth_url(),
            data_url: default_data_url(),
        }
    }
}

// =============================================================================
// Timeout Settings
// =============================================================================

/// Time budgets for every bounded operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSettings {
    /// Slow-path session check against the auth service (seconds).
    #[serde(default = "default_session_check")]
    pub session_check_secs: u64,

    /// Per-domain fetch budget (seconds).
    #[serde(default = "default_domain_fetch")]
    pub domain_fetch_secs: u64,

    /// Per-record push budget (seconds).
    #[serde(default = "default_push_request")]
    pub push_request_secs: u64,

    /// Hard wall-clock ceiling for initialization (seconds).
    #[serde(default = "default_init_ceiling")]
    pub init_ceiling_secs: u64,
}

fn default_session_check() -> u64 {
    2
}
fn default_domain_fetch() -> u64 {
    3
}
fn default_push_request() -> u64 {
    3
}
fn default_init_ceiling() -> u64 {
    10
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        TimeoutSettings {
            session_check_secs: default_session_check(),
            domain_fetch_secs: default_domain_fetch(),
            push_request_secs: default_push_request(),
            init_ceiling_secs: default_init_ceiling(),
        }
    }
}

impl TimeoutSettings {
    pub fn session_check(&self) -> Duration {
        Duration::from_secs(self.session_check_secs)
    }

    pub fn domain_fetch(&self) -> Duration {
        Duration::from_secs(self.domain_fetch_secs)
    }

    pub fn push_request(&self) -> Duration {
        Duration::from_secs(self.push_request_secs)
    }

    pub fn init_ceiling(&self) -> Duration {
        Duration::from_secs(self.init_ceiling_secs)
    }
}

// =============================================================================
// Scheduler Settings
// =============================================================================

/// Auto-sync scheduler behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Interval between background push passes (seconds).
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

fn default_interval() -> u64 {
    60
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        SchedulerSettings {
            interval_secs: default_interval(),
        }
    }
}

impl SchedulerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
///
/// ## Example Config File
/// ```toml
/// [endpoints]
/// auth_url = "https://auth.lifehub.app"
/// data_url = "https://data.lifehub.app"
///
/// [timeouts]
/// session_check_secs = 2
/// domain_fetch_secs = 3
/// init_ceiling_secs = 10
///
/// [scheduler]
/// interval_secs = 60
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Service endpoints.
    #[serde(default)]
    pub endpoints: EndpointSettings,

    /// Time budgets.
    #[serde(default)]
    pub timeouts: TimeoutSettings,

    /// Scheduler behavior.
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

impl SyncConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::InvalidConfig("no config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        for (name, url) in [
            ("auth_url", &self.endpoints.auth_url),
            ("data_url", &self.endpoints.data_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SyncError::InvalidConfig(format!(
                    "{} must start with http:// or https://, got: {}",
                    name, url
                )));
            }
        }

        for (name, secs) in [
            ("session_check_secs", self.timeouts.session_check_secs),
            ("domain_fetch_secs", self.timeouts.domain_fetch_secs),
            ("push_request_secs", self.timeouts.push_request_secs),
            ("interval_secs", self.scheduler.interval_secs),
        ] {
            if secs == 0 {
                return Err(SyncError::InvalidConfig(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        // Timeout nesting: the ceiling wraps the session check plus the
        // data fetch, so it must strictly exceed their sum.
        let inner = self.timeouts.session_check_secs + self.timeouts.domain_fetch_secs;
        if self.timeouts.init_ceiling_secs <= inner {
            return Err(SyncError::InvalidConfig(format!(
                "init_ceiling_secs ({}) must exceed session_check_secs + domain_fetch_secs ({})",
                self.timeouts.init_ceiling_secs, inner
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LIFEHUB_AUTH_URL") {
            debug!(url = %url, "Overriding auth URL from environment");
            self.endpoints.auth_url = url;
        }

        if let Ok(url) = std::env::var("LIFEHUB_DATA_URL") {
            debug!(url = %url, "Overriding data URL from environment");
            self.endpoints.data_url = url;
        }

        if let Ok(secs) = std::env::var("LIFEHUB_SYNC_INTERVAL_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                self.scheduler.interval_secs = s;
            }
        }

        if let Ok(secs) = std::env::var("LIFEHUB_INIT_CEILING_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                self.timeouts.init_ceiling_secs = s;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("app", "lifehub", "lifehub")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }
}
