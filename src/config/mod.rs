pub mod settings;

pub use settings::{Config, LogRotation};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding `Config::endpoint`
pub const ENV_ENDPOINT: &str = "OPSEARCH_ENDPOINT";
/// Environment variable overriding `Config::debounce_ms`
pub const ENV_DEBOUNCE_MS: &str = "OPSEARCH_DEBOUNCE_MS";

/// Get the configuration directory, creating it if needed
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("Failed to get config directory")?
        .join("opsearch");

    fs::create_dir_all(&dir).context("Failed to create config directory")?;

    Ok(dir)
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load configuration from the default path, or create it if missing.
///
/// Environment overrides are applied on top of whatever was loaded.
pub fn load_or_create_config() -> Result<Config> {
    let path = config_path()?;

    let mut config = if path.exists() {
        load_from(&path)?
    } else {
        let config = Config::default();
        save_to(&config, &path)?;

        println!("Created default config at: {}", path.display());
        config
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Load configuration from an explicit path
pub fn load_from(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Save configuration to an explicit path
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

/// Apply `OPSEARCH_*` overrides using the given variable lookup.
///
/// Unparseable values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup(ENV_ENDPOINT) {
        let endpoint = endpoint.trim();
        if !endpoint.is_empty() {
            config.endpoint = endpoint.to_string();
        }
    }

    if let Some(raw) = lookup(ENV_DEBOUNCE_MS) {
        match raw.trim().parse::<u64>() {
            Ok(ms) => config.debounce_ms = ms,
            Err(e) => {
                tracing::warn!(value = %raw, error = %e, "ignoring invalid {}", ENV_DEBOUNCE_MS);
            }
        }
    }
}
