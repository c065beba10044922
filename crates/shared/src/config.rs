//! Application configuration management.

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Default upload ceiling: 200 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 200 * 1024 * 1024;

/// Shortest link lifetime, in minutes.
pub const MIN_SAS_TTL_MINUTES: u32 = 1;
/// Longest link lifetime, in minutes (7 days).
pub const MAX_SAS_TTL_MINUTES: u32 = 10_080;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the built front-end bundle.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> String {
    "frontend/dist".to_string()
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            log_format: LogFormat::default(),
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Storage account name. Required at startup.
    #[serde(default)]
    pub account_name: Option<String>,
    /// Base64 shared key. When absent the ambient identity is used.
    #[serde(default)]
    pub account_key: Option<String>,
    /// Container holding uploaded objects.
    #[serde(default = "default_container")]
    pub container: String,
    /// Blob service endpoint override (Azurite, sovereign clouds).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Default validity of issued links, in minutes.
    #[serde(default = "default_sas_ttl_minutes")]
    pub sas_ttl_minutes: u32,
}

fn default_container() -> String {
    "sharesafely".to_string()
}

fn default_sas_ttl_minutes() -> u32 {
    60
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            account_name: None,
            account_key: None,
            container: default_container(),
            endpoint: None,
            sas_ttl_minutes: default_sas_ttl_minutes(),
        }
    }
}

impl StorageSettings {
    /// Returns the account name or a configuration error when it is missing.
    pub fn require_account_name(&self) -> AppResult<&str> {
        self.account_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AppError::Configuration("AZURE_STORAGE_ACCOUNT_NAME not set".into()))
    }
}

/// Plain environment variables honoured on top of `SHARESAFELY__*`.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("AZURE_STORAGE_ACCOUNT_NAME", "storage.account_name"),
    ("AZURE_STORAGE_ACCOUNT_KEY", "storage.account_key"),
    ("AZURE_BLOB_CONTAINER", "storage.container"),
    ("AZURE_STORAGE_ENDPOINT", "storage.endpoint"),
    ("SAS_TOKEN_TTL_MINUTES", "storage.sas_ttl_minutes"),
    ("PORT", "server.port"),
];

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Loads configuration from config files and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SHARESAFELY").separator("__"));

        for (var, key) in ENV_OVERRIDES {
            builder = builder.set_override_option(*key, non_empty_env(var))?;
        }

        builder.build()?.try_deserialize()
    }

    /// Rejects settings that would make every request fail.
    pub fn validate(&self) -> AppResult<()> {
        let ttl = self.storage.sas_ttl_minutes;
        if !(MIN_SAS_TTL_MINUTES..=MAX_SAS_TTL_MINUTES).contains(&ttl) {
            return Err(AppError::Configuration(format!(
                "SAS_TOKEN_TTL_MINUTES must be between {MIN_SAS_TTL_MINUTES} and {MAX_SAS_TTL_MINUTES}, got {ttl}"
            )));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(AppError::Configuration(
                "max_upload_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: &[&str] = &[
        "AZURE_STORAGE_ACCOUNT_NAME",
        "AZURE_STORAGE_ACCOUNT_KEY",
        "AZURE_BLOB_CONTAINER",
        "AZURE_STORAGE_ENDPOINT",
        "SAS_TOKEN_TTL_MINUTES",
        "PORT",
        "RUN_MODE",
        "SHARESAFELY__SERVER__LOG_FORMAT",
        "SHARESAFELY__SERVER__MAX_UPLOAD_BYTES",
    ];

    fn with_env<R>(set: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
        let vars: Vec<(&str, Option<&str>)> = ALL_VARS
            .iter()
            .map(|name| {
                let value = set.iter().find(|(k, _)| k == name).map(|(_, v)| *v);
                (*name, value)
            })
            .collect();
        temp_env::with_vars(vars, f)
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = with_env(&[], AppConfig::load).expect("config should load");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.server.log_format, LogFormat::Pretty);
        assert_eq!(config.storage.container, "sharesafely");
        assert_eq!(config.storage.sas_ttl_minutes, 60);
        assert!(config.storage.account_name.is_none());
        assert!(config.storage.account_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_plain_azure_variables_are_mapped() {
        let config = with_env(
            &[
                ("AZURE_STORAGE_ACCOUNT_NAME", "shareacct"),
                ("AZURE_STORAGE_ACCOUNT_KEY", "a2V5"),
                ("AZURE_BLOB_CONTAINER", "uploads"),
                ("SAS_TOKEN_TTL_MINUTES", "15"),
                ("PORT", "8081"),
            ],
            AppConfig::load,
        )
        .expect("config should load");

        assert_eq!(config.storage.account_name.as_deref(), Some("shareacct"));
        assert_eq!(config.storage.account_key.as_deref(), Some("a2V5"));
        assert_eq!(config.storage.container, "uploads");
        assert_eq!(config.storage.sas_ttl_minutes, 15);
        assert_eq!(config.server.port, 8081);
    }

    #[test]
    fn test_empty_account_key_counts_as_absent() {
        let config = with_env(
            &[
                ("AZURE_STORAGE_ACCOUNT_NAME", "shareacct"),
                ("AZURE_STORAGE_ACCOUNT_KEY", ""),
            ],
            AppConfig::load,
        )
        .expect("config should load");

        assert!(config.storage.account_key.is_none());
    }

    #[test]
    fn test_prefixed_variables() {
        let config = with_env(
            &[
                ("SHARESAFELY__SERVER__LOG_FORMAT", "json"),
                ("SHARESAFELY__SERVER__MAX_UPLOAD_BYTES", "1024"),
            ],
            AppConfig::load,
        )
        .expect("config should load");

        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.server.max_upload_bytes, 1024);
    }

    #[rstest::rstest]
    #[case("0")]
    #[case("10081")]
    fn test_out_of_range_default_ttl_is_a_configuration_error(#[case] ttl: &str) {
        let config = with_env(&[("SAS_TOKEN_TTL_MINUTES", ttl)], AppConfig::load)
            .expect("config should load");

        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("SAS_TOKEN_TTL_MINUTES"));
    }

    #[test]
    fn test_ttl_bounds_are_inclusive() {
        let mut config = AppConfig::default();
        config.storage.sas_ttl_minutes = MIN_SAS_TTL_MINUTES;
        assert!(config.validate().is_ok());
        config.storage.sas_ttl_minutes = MAX_SAS_TTL_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_upload_ceiling_is_rejected() {
        let mut config = AppConfig::default();
        config.server.max_upload_bytes = 0;
        assert!(matches!(config.validate(), Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_require_account_name() {
        let mut settings = StorageSettings::default();
        let err = settings.require_account_name().unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));

        settings.account_name = Some("   ".into());
        assert!(settings.require_account_name().is_err());

        settings.account_name = Some("shareacct".into());
        assert_eq!(settings.require_account_name().unwrap(), "shareacct");
    }
}
