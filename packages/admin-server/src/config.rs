//! Runtime configuration
//!
//! `AdminConfig` is what the running server uses. It is built once at
//! startup from an optional JSON preferences file (`ARBOR_CONFIG`) with
//! environment variables layered on top:
//!
//! - `ARBOR_PORT`: listen port (default 3001)
//! - `ARBOR_DB_PATH`: database file (default `~/.arbor/database/arbor.db`)
//! - `ARBOR_ADMIN_USER` / `ARBOR_ADMIN_PASSWORD`: an extra administrator
//! - `ARBOR_SEED_ON_START`: load the demo taxonomy before serving

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

use crate::constants::{ADMIN_ROLE, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USER, DEFAULT_PORT};

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to get home directory")]
    HomeDirUnavailable,

    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: String, value: String },

    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    fn invalid_value(var: &str, value: &str) -> Self {
        Self::InvalidValue {
            var: var.to_string(),
            value: value.to_string(),
        }
    }
}

/// A principal allowed to sign in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Account {
    /// An account holding the administrator role
    pub fn admin(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            roles: vec![ADMIN_ROLE.to_string()],
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// On-disk preferences. All fields use `#[serde(default)]` so partial files
/// deserialize without error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminPreferences {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub accounts: Vec<Account>,

    #[serde(default)]
    pub seed_on_start: bool,
}

/// Load preferences from a JSON file
pub async fn load_preferences(path: &Path) -> Result<AdminPreferences, ConfigError> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_str(&contents).map_err(|source| ConfigError::ParseFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Default database location: `~/.arbor/database/arbor.db`
pub fn get_default_database_path() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::HomeDirUnavailable)?;
    Ok(home_dir.join(".arbor").join("database").join("arbor.db"))
}

/// Runtime configuration, immutable for the server lifetime
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub port: u16,
    pub database_path: PathBuf,
    pub accounts: Vec<Account>,
    pub seed_on_start: bool,
}

impl AdminConfig {
    /// Build the configuration from `ARBOR_CONFIG` (if set) and the process
    /// environment.
    pub async fn load() -> Result<Self, ConfigError> {
        let prefs = match std::env::var("ARBOR_CONFIG") {
            Ok(path) => load_preferences(Path::new(&path)).await?,
            Err(_) => AdminPreferences::default(),
        };

        Self::from_sources(prefs, |key| std::env::var(key).ok())
    }

    /// Layer environment values (looked up through `env`) over `prefs`
    pub fn from_sources<F>(prefs: AdminPreferences, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match env("ARBOR_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::invalid_value("ARBOR_PORT", &value))?,
            None => prefs.port.unwrap_or(DEFAULT_PORT),
        };

        let database_path = match env("ARBOR_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => match prefs.database_path {
                Some(path) => path,
                None => get_default_database_path()?,
            },
        };

        let seed_on_start = match env("ARBOR_SEED_ON_START") {
            Some(value) => parse_flag("ARBOR_SEED_ON_START", &value)?,
            None => prefs.seed_on_start,
        };

        let mut accounts = prefs.accounts;
        if let (Some(user), Some(password)) = (env("ARBOR_ADMIN_USER"), env("ARBOR_ADMIN_PASSWORD")) {
            accounts.retain(|account| account.username != user);
            accounts.push(Account::admin(user, password));
        }
        if accounts.is_empty() {
            tracing::warn!(
                "No accounts configured, falling back to default administrator {}",
                DEFAULT_ADMIN_USER
            );
            accounts.push(Account::admin(DEFAULT_ADMIN_USER, DEFAULT_ADMIN_PASSWORD));
        }

        Ok(Self {
            port,
            database_path,
            accounts,
            seed_on_start,
        })
    }
}

/// Read a boolean switch such as `1`, `true`, `yes`, `off`
pub(crate) fn flag_value(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn parse_flag(var: &str, value: &str) -> Result<bool, ConfigError> {
    flag_value(value).ok_or_else(|| ConfigError::invalid_value(var, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_environment_overrides_preferences() {
        let prefs = AdminPreferences {
            port: Some(4000),
            database_path: Some(PathBuf::from("/tmp/prefs.db")),
            accounts: vec![],
            seed_on_start: false,
        };

        let config = AdminConfig::from_sources(
            prefs,
            env_from(&[
                ("ARBOR_PORT", "5000"),
                ("ARBOR_DB_PATH", "/tmp/env.db"),
                ("ARBOR_SEED_ON_START", "true"),
                ("ARBOR_ADMIN_USER", "root"),
                ("ARBOR_ADMIN_PASSWORD", "secret"),
            ]),
        )
        .unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.database_path, PathBuf::from("/tmp/env.db"));
        assert!(config.seed_on_start);
        assert_eq!(config.accounts, vec![Account::admin("root", "secret")]);
    }

    #[test]
    fn test_preferences_used_without_environment() {
        let prefs = AdminPreferences {
            port: Some(4000),
            database_path: Some(PathBuf::from("/tmp/prefs.db")),
            accounts: vec![Account {
                username: "viewer".to_string(),
                password: "pw".to_string(),
                roles: vec![],
            }],
            seed_on_start: true,
        };

        let config = AdminConfig::from_sources(prefs, env_from(&[])).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.database_path, PathBuf::from("/tmp/prefs.db"));
        assert!(config.seed_on_start);
        assert_eq!(config.accounts.len(), 1);
        assert!(!config.accounts[0].has_role(ADMIN_ROLE));
    }

    #[test]
    fn test_default_administrator() {
        let config = tokio_test::assert_ok!(AdminConfig::from_sources(
            AdminPreferences::default(),
            env_from(&[("ARBOR_DB_PATH", "/tmp/a.db")]),
        ));

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].username, DEFAULT_ADMIN_USER);
        assert!(config.accounts[0].has_role(ADMIN_ROLE));
    }

    #[test]
    fn test_invalid_values() {
        let result = AdminConfig::from_sources(
            AdminPreferences::default(),
            env_from(&[("ARBOR_PORT", "not-a-port"), ("ARBOR_DB_PATH", "/tmp/a.db")]),
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = AdminConfig::from_sources(
            AdminPreferences::default(),
            env_from(&[("ARBOR_SEED_ON_START", "maybe"), ("ARBOR_DB_PATH", "/tmp/a.db")]),
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_flag_values() {
        assert_eq!(flag_value("1"), Some(true));
        assert_eq!(flag_value(" TRUE "), Some(true));
        assert_eq!(flag_value("on"), Some(true));
        assert_eq!(flag_value("off"), Some(false));
        assert_eq!(flag_value(""), Some(false));
        assert_eq!(flag_value("maybe"), None);
    }

    #[tokio::test]
    async fn test_load_preferences_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("arbor.json");
        tokio::fs::write(
            &path,
            r#"{ "port": 3100, "accounts": [{ "username": "a", "password": "b", "roles": ["Admin"] }] }"#,
        )
        .await
        .unwrap();

        let prefs = load_preferences(&path).await.unwrap();
        assert_eq!(prefs.port, Some(3100));
        assert!(prefs.database_path.is_none());
        assert!(!prefs.seed_on_start);
        assert!(prefs.accounts[0].has_role(ADMIN_ROLE));

        tokio::fs::write(&path, "{ not json").await.unwrap();
        assert!(matches!(
            load_preferences(&path).await,
            Err(ConfigError::ParseFailed { .. })
        ));

        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(
            load_preferences(&missing).await,
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}
