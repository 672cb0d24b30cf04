mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./audiohook.toml",
        "~/.config/audiohook/config.toml",
        "/etc/audiohook/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.queue_capacity == 0 {
        anyhow::bail!("Queue capacity must be at least 1");
    }

    if config.regions.list.iter().all(|r| r.trim().is_empty()) {
        anyhow::bail!("At least one region must be configured");
    }

    if config.regions.max_regions_to_try == 0 {
        anyhow::bail!("max_regions_to_try must be at least 1");
    }

    if !(config.http.backoff_base >= 1.0) {
        anyhow::bail!(
            "backoff_base must be >= 1.0 (got {})",
            config.http.backoff_base
        );
    }

    if config.http.max_retries == 0 {
        anyhow::bail!("max_retries must be at least 1");
    }

    for notifier in &config.notifiers {
        if notifier.enabled && notifier.url.trim().is_empty() {
            anyhow::bail!("Notifier '{}' is enabled but has no URL", notifier.name);
        }
    }

    if config.mam.enabled
        && config
            .mam
            .session_cookie
            .as_deref()
            .map_or(true, |c| c.trim().is_empty())
    {
        anyhow::bail!("MAM is enabled but has no session cookie");
    }

    Ok(())
}
