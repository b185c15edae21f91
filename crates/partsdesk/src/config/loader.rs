use std::path::{Path, PathBuf};

use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

/// Environment variable that replaces `api.base_url`.
pub const API_URL_ENV_VAR: &str = "PARTSDESK_API_URL";

/// `~/.partsdesk/config.json`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".partsdesk").join("config.json"))
        .ok_or(ConfigError::NoConfigLocation)
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    log::debug!("Loading config from {}", path.display());
    load_config_from_str(&content)
}

/// Loads the config at `path`, or the default location when `None`.
///
/// A missing file at the default location is not an error: defaults are
/// used, still subject to the environment override.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        return load_config(path);
    }

    let default_path = default_config_path()?;
    if default_path.exists() {
        return load_config(&default_path);
    }

    log::debug!(
        "No config at {}, using defaults",
        default_path.display()
    );
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let mut config: Config = serde_json::from_value(json_value)?;

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(url) = std::env::var(API_URL_ENV_VAR) {
        let url = url.trim();
        if !url.is_empty() {
            log::debug!("{} overrides api.base_url", API_URL_ENV_VAR);
            config.api.base_url = url.to_string();
        }
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    validate_base_url(&config.api.base_url)?;

    if config.api.connect_timeout_secs == 0 || config.api.request_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "API timeouts must be greater than zero".to_string(),
        });
    }
    if config.polling.interval_ms == 0 {
        return Err(ConfigError::Validation {
            message: "polling.interval_ms must be greater than zero".to_string(),
        });
    }
    if config.paging.jobs_per_page == 0
        || config.paging.parts_per_page == 0
        || config.paging.dashboard_page_size == 0
    {
        return Err(ConfigError::Validation {
            message: "Page sizes must be greater than zero".to_string(),
        });
    }

    Ok(())
}

fn validate_base_url(url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = reqwest::Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment".to_string()));
    }
    Ok(())
}
