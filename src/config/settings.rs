use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default lookup endpoint of the registry search API
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/api/search";

/// Default quiescence interval before a settled query is looked up
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Search endpoint; the query is sent as the `q` parameter
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Quiescence interval in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Write debug logs to a file
    #[serde(default)]
    pub debug: bool,

    /// Log file (or directory) override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_rotation: Option<LogRotation>,

    /// How many rotated log files to keep (0 = keep all)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_keep: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            debounce_ms: default_debounce_ms(),
            debug: false,
            debug_log_path: None,
            debug_log_rotation: None,
            debug_log_keep: None,
        }
    }
}

impl Config {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Log file rotation policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Single file, appended to across runs
    None,
    /// One file per day
    Daily,
    /// One file per process start
    Session,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}
