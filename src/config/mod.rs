mod schema;

pub use schema::{Config, RosterEntry};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::roster::Entity;
use crate::scores::DEFAULT_MAX_IN_FLIGHT;
use crate::transport::DEFAULT_TIMEOUT;

/// Get the config directory path (~/.config/scorecard/)
pub fn get_config_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Could not determine home directory");
    home.join(".config").join("scorecard")
}

/// Get the default config file path (~/.config/scorecard/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path
///   (~/.config/scorecard/config.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - The config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Create ~/.config/scorecard/config.yaml",
            config_path.display()
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    Ok(config)
}

/// Validate a loaded config. Returns all problems at once so the user can
/// fix them in one pass.
pub fn validate_config(config: &Config) -> std::result::Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(0) = config.max_in_flight {
        errors.push("max_in_flight must be at least 1".to_string());
    }

    if let Some(timeout) = &config.timeout {
        if humantime::parse_duration(timeout).is_err() {
            errors.push(format!(
                "timeout {:?} is not a duration (expected e.g. \"10s\")",
                timeout
            ));
        }
    }

    let mut seen_ids = HashSet::new();
    for entry in &config.roster {
        if !seen_ids.insert(entry.id) {
            errors.push(format!("duplicate roster id {}", entry.id));
        }

        let has_key = entry.search_key.as_deref().is_some_and(|k| !k.is_empty());
        if has_key && (entry.region.is_none() || entry.locale.is_none()) {
            errors.push(format!(
                "roster id {}: search_key is set but region/locale is missing",
                entry.id
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl Config {
    /// Roster entries as entities. Entries without a usable search key
    /// become unranked entities (score 0, no network access).
    pub fn entities(&self) -> Vec<Entity> {
        self.roster
            .iter()
            .map(|entry| {
                match (&entry.search_key, &entry.region, &entry.locale) {
                    (Some(key), Some(region), Some(locale)) if !key.is_empty() => {
                        Entity::ranked(entry.id, key.clone(), region.clone(), locale.clone())
                    }
                    _ => Entity::unranked(entry.id),
                }
            })
            .collect()
    }

    /// Parsed per-request timeout; falls back to the transport default.
    pub fn request_timeout(&self) -> Result<Duration> {
        match &self.timeout {
            Some(timeout) => humantime::parse_duration(timeout)
                .with_context(|| format!("Invalid timeout in config: {:?}", timeout)),
            None => Ok(DEFAULT_TIMEOUT),
        }
    }

    pub fn effective_max_in_flight(&self) -> usize {
        self.max_in_flight.unwrap_or(DEFAULT_MAX_IN_FLIGHT)
    }
}
