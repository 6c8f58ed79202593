//! Connection and runtime configuration.
//!
//! # Responsibility
//! - Hold immutable Fedora connection settings and the user database path.
//! - Load settings from `ALVIN_*` environment variables.
//!
//! # Invariants
//! - A validated config has non-blank values and an `http`/`https` base URL.
//! - The Fedora password never appears in `Debug` output or logs.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;
use url::Url;

pub const FEDORA_URL_VAR: &str = "ALVIN_FEDORA_URL";
pub const FEDORA_USERNAME_VAR: &str = "ALVIN_FEDORA_USERNAME";
pub const FEDORA_PASSWORD_VAR: &str = "ALVIN_FEDORA_PASSWORD";
pub const USER_DB_VAR: &str = "ALVIN_USER_DB";
pub const GUEST_USER_ID_VAR: &str = "ALVIN_GUEST_USER_ID";
pub const LOG_LEVEL_VAR: &str = "ALVIN_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "ALVIN_LOG_DIR";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Blank(&'static str),
    InvalidUrl { value: String, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required setting {key}"),
            Self::Blank(key) => write!(f, "setting {key} must not be blank"),
            Self::InvalidUrl { value, message } => {
                write!(f, "invalid fedora base url `{value}`: {message}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Fedora connection settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct FedoraConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl FedoraConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        require_non_blank(FEDORA_URL_VAR, &self.base_url)?;
        require_non_blank(FEDORA_USERNAME_VAR, &self.username)?;
        require_non_blank(FEDORA_PASSWORD_VAR, &self.password)?;

        let invalid = |message: String| ConfigError::InvalidUrl {
            value: self.base_url.clone(),
            message,
        };
        let url = Url::parse(self.base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(invalid(format!("unsupported scheme `{other}`"))),
        }
    }
}

impl Debug for FedoraConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FedoraConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything needed to assemble the mixed storage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    pub fedora: FedoraConfig,
    pub user_db: PathBuf,
    #[serde(default)]
    pub guest_user_id: Option<String>,
    #[serde(default = "default_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Reads the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup` and validates them.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            fedora: FedoraConfig::new(
                required(FEDORA_URL_VAR)?,
                required(FEDORA_USERNAME_VAR)?,
                required(FEDORA_PASSWORD_VAR)?,
            ),
            user_db: PathBuf::from(required(USER_DB_VAR)?),
            guest_user_id: optional(GUEST_USER_ID_VAR),
            log_level: optional(LOG_LEVEL_VAR).unwrap_or_else(default_level),
            log_dir: optional(LOG_DIR_VAR).map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.fedora.validate()?;
        if self.user_db.as_os_str().is_empty() {
            return Err(ConfigError::Blank(USER_DB_VAR));
        }
        Ok(())
    }
}

fn default_level() -> String {
    default_log_level().to_string()
}

fn require_non_blank(key: &'static str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::Blank(key));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, FedoraConfig, StorageConfig};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| values.get(key).cloned()
    }

    const COMPLETE: &[(&str, &str)] = &[
        ("ALVIN_FEDORA_URL", "http://alvin-cora-fedora:8088/fedora/"),
        ("ALVIN_FEDORA_USERNAME", "fedoraAdmin"),
        ("ALVIN_FEDORA_PASSWORD", "fedora"),
        ("ALVIN_USER_DB", "/var/lib/alvin/users.sqlite3"),
        ("ALVIN_GUEST_USER_ID", "12345"),
        ("ALVIN_LOG_LEVEL", "warn"),
    ];

    #[test]
    fn loads_complete_settings() {
        let config = StorageConfig::from_lookup(lookup_from(COMPLETE)).unwrap();
        assert_eq!(config.fedora.username, "fedoraAdmin");
        assert_eq!(config.user_db, PathBuf::from("/var/lib/alvin/users.sqlite3"));
        assert_eq!(config.guest_user_id.as_deref(), Some("12345"));
        assert_eq!(config.log_level, "warn");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn missing_and_blank_values_are_rejected() {
        let err = StorageConfig::from_lookup(lookup_from(&COMPLETE[1..])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("ALVIN_FEDORA_URL"));

        let mut pairs = COMPLETE.to_vec();
        pairs[2] = ("ALVIN_FEDORA_PASSWORD", "  ");
        let err = StorageConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Blank("ALVIN_FEDORA_PASSWORD"));
    }

    #[test]
    fn base_url_must_be_http() {
        let err = FedoraConfig::new("ftp://fedora", "user", "pass")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
        assert!(FedoraConfig::new("not a url", "user", "pass").validate().is_err());
        assert!(FedoraConfig::new("https://fedora", "user", "pass").validate().is_ok());
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = FedoraConfig::new("http://fedora", "fedoraAdmin", "s3cret");
        let debug = format!("{config:?}");
        assert!(debug.contains("fedoraAdmin"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: StorageConfig = serde_json::from_str(
            r#"{"fedora":{"base_url":"http://fedora","username":"u","password":"p"},
                "user_db":"/tmp/users.sqlite3"}"#,
        )
        .unwrap();
        assert!(config.guest_user_id.is_none());
        assert!(!config.log_level.is_empty());
        assert!(config.validate().is_ok());
    }
}
