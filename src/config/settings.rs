//! Application settings loading from config.toml
//!
//! Every section has defaults, so a missing `config.toml` yields a working
//! local setup. A few values can be overridden from the environment (usually
//! via `.env`): `DATABASE_URL`, `BIND_ADDRESS` and `EXPENSE_BUDDY_CONFIG`
//! (path of the TOML file itself).

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "EXPENSE_BUDDY_CONFIG";

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Server-side database settings
    pub database: DatabaseConfig,
    /// Budget alert thresholds
    pub alerts: AlertThresholds,
    /// Expense listing settings
    pub expenses: ExpenseConfig,
    /// Offline client settings
    pub client: ClientConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `127.0.0.1:3000`
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Server-side database settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SeaORM` connection URL
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://expense_buddy.sqlite?mode=rwc".to_string(),
        }
    }
}

/// Ratios at which a budget produces a warning or an exceeded alert
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Ratio from which a `budget_warning` is raised
    pub warning_ratio: f64,
    /// Ratio from which a `budget_exceeded` is raised
    pub exceeded_ratio: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            warning_ratio: 0.8,
            exceeded_ratio: 1.0,
        }
    }
}

/// Expense listing settings
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ExpenseConfig {
    /// Maximum number of expenses returned by a listing
    pub list_limit: u64,
}

impl Default for ExpenseConfig {
    fn default() -> Self {
        Self { list_limit: 200 }
    }
}

/// Offline client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the expense API, including the `/api` prefix
    pub api_base_url: String,
    /// Per-request timeout; exceeding it counts as a transient failure
    pub timeout_secs: u64,
    /// `SeaORM` URL of the on-device store holding the pending queue
    pub queue_database_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000/api".to_string(),
            timeout_secs: 10,
            queue_database_url: "sqlite://pending_expenses.sqlite?mode=rwc".to_string(),
        }
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - The alert thresholds are not ordered `0 < warning <= exceeded`
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    let config: AppConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })?;
    validate(&config)?;
    Ok(config)
}

/// Loads the application configuration the way the server binary does.
///
/// Reads the file named by `EXPENSE_BUDDY_CONFIG` (default `./config.toml`),
/// falling back to defaults when the default file is absent, then applies
/// `DATABASE_URL` and `BIND_ADDRESS` overrides from the environment.
pub fn load_app_configuration() -> Result<AppConfig> {
    let explicit = std::env::var(CONFIG_PATH_ENV).ok();
    let path = explicit.clone().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let mut config = if explicit.is_none() && !Path::new(&path).exists() {
        info!("No {} found, using default configuration.", path);
        AppConfig::default()
    } else {
        load_config(&path)?
    };

    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database.url = url;
    }
    if let Ok(addr) = std::env::var("BIND_ADDRESS") {
        config.server.bind_address = addr;
    }
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<()> {
    let AlertThresholds {
        warning_ratio,
        exceeded_ratio,
    } = config.alerts;
    if !(warning_ratio > 0.0 && warning_ratio <= exceeded_ratio && exceeded_ratio.is_finite()) {
        return Err(Error::Config {
            message: format!(
                "alert thresholds must satisfy 0 < warning_ratio <= exceeded_ratio (got {warning_ratio} / {exceeded_ratio})"
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [server]
            bind_address = "0.0.0.0:8080"

            [database]
            url = "sqlite::memory:"

            [alerts]
            warning_ratio = 0.75
            exceeded_ratio = 1.0

            [expenses]
            list_limit = 50

            [client]
            api_base_url = "https://example.test/api"
            timeout_secs = 3
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.alerts.warning_ratio, 0.75);
        assert_eq!(config.expenses.list_limit, 50);
        assert_eq!(config.client.timeout_secs, 3);
        // Unspecified keys keep their defaults
        assert_eq!(
            config.client.queue_database_url,
            ClientConfig::default().queue_database_url
        );
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.alerts, AlertThresholds::default());
        assert_eq!(config.expenses.list_limit, 200);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let config: AppConfig = toml::from_str(
            r"
            [alerts]
            warning_ratio = 1.2
            exceeded_ratio = 1.0
            ",
        )
        .unwrap();
        assert!(matches!(validate(&config), Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
