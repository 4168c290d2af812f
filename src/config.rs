//! Configuration loading for KisaanMitra.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::conversation::DEFAULT_HISTORY_CAPACITY;
use crate::core::dispatch::DispatchConfig;
use crate::core::notification::DEFAULT_NOTIFICATION_CAPACITY;
use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Get the KisaanMitra home directory (~/.kisaanmitra).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".kisaanmitra"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.kisaanmitra/settings.json
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_settings_path()?)
}

/// Load and validate settings from an explicit path.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;

    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings or return default if not found.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings: {}, using defaults", e);
        Settings::default()
    })
}

fn validate_settings(settings: &Settings) -> Result<()> {
    let d = &settings.dispatch;
    if d.min_latency_ms > d.max_latency_ms {
        return Err(Error::Config(format!(
            "dispatch.min_latency_ms ({}) exceeds dispatch.max_latency_ms ({})",
            d.min_latency_ms, d.max_latency_ms
        )));
    }
    if d.timeout_seconds == 0 {
        return Err(Error::Config("dispatch.timeout_seconds must be positive".to_string()));
    }
    if settings.history.capacity == 0 {
        return Err(Error::Config("history.capacity must be positive".to_string()));
    }
    if settings.notifications.capacity == 0 {
        return Err(Error::Config("notifications.capacity must be positive".to_string()));
    }
    Ok(())
}

/// Dispatch configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DispatchSettings {
    #[serde(default = "default_min_latency_ms")]
    pub min_latency_ms: u64,
    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u64,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_notify_on_failure")]
    pub notify_on_failure: bool,
    #[serde(default = "default_failure_notification_ttl_ms")]
    pub failure_notification_ttl_ms: u64,
}

fn default_min_latency_ms() -> u64 {
    1000
}

fn default_max_latency_ms() -> u64 {
    3000
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_notify_on_failure() -> bool {
    true
}

fn default_failure_notification_ttl_ms() -> u64 {
    5000
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            min_latency_ms: default_min_latency_ms(),
            max_latency_ms: default_max_latency_ms(),
            timeout_seconds: default_timeout_seconds(),
            notify_on_failure: default_notify_on_failure(),
            failure_notification_ttl_ms: default_failure_notification_ttl_ms(),
        }
    }
}

/// History configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HistorySettings {
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

/// Notification configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NotificationSettings {
    #[serde(default = "default_notification_capacity")]
    pub capacity: usize,
    #[serde(default = "default_notification_ttl_ms")]
    pub default_ttl_ms: u64,
}

fn default_notification_capacity() -> usize {
    DEFAULT_NOTIFICATION_CAPACITY
}

fn default_notification_ttl_ms() -> u64 {
    5000
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            capacity: default_notification_capacity(),
            default_ttl_ms: default_notification_ttl_ms(),
        }
    }
}

/// KisaanMitra settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub dispatch: DispatchSettings,

    #[serde(default)]
    pub history: HistorySettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    /// Display-name overrides keyed by agent id.
    #[serde(default)]
    pub agents: HashMap<String, String>,

    /// Preference file override; defaults to ~/.kisaanmitra/preferences.json
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,
}

impl Settings {
    /// Engine configuration derived from these settings.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            min_latency: Duration::from_millis(self.dispatch.min_latency_ms),
            max_latency: Duration::from_millis(self.dispatch.max_latency_ms),
            timeout: Duration::from_secs(self.dispatch.timeout_seconds),
            notify_on_failure: self.dispatch.notify_on_failure,
            failure_notification_ttl: Duration::from_millis(
                self.dispatch.failure_notification_ttl_ms,
            ),
            history_capacity: self.history.capacity,
            notification_capacity: self.notifications.capacity,
        }
    }

    /// TTL for UI-level notifications.
    pub fn default_notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notifications.default_ttl_ms)
    }
}
