//! Configuration for the WFRMLS agent and CLI.
//!
//! Settings are layered defaults < TOML file < `WFRMLS_*` environment,
//! then validated into a `wfrmls_core::AgentConfig`. The CLI applies its
//! own flag overrides on top of [`Settings`] before converting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wfrmls_core::{AgentConfig, CoreError, LogLevel};

/// Prefix for environment overrides, e.g. `WFRMLS_SYNC_INTERVAL`.
pub const ENV_PREFIX: &str = "WFRMLS_";

const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no bearer token configured (set WFRMLS_BEARER_TOKEN or bearer_token)")]
    MissingToken,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<CoreError> for ConfigError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidConfig { field, reason } => Self::Validation {
                field: field.into(),
                reason,
            },
            other => Self::Validation {
                field: "config".into(),
                reason: other.to_string(),
            },
        }
    }
}

// ── TOML settings ───────────────────────────────────────────────────

/// Agent settings as they appear in the config file. Intervals are seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_sync_interval")]
    pub sync_interval: u64,

    #[serde(default = "default_monitor_interval")]
    pub monitor_interval: u64,

    #[serde(default = "default_health_check_interval")]
    pub health_check_interval: u64,

    /// DEBUG, INFO, WARNING or ERROR (case-insensitive).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_true")]
    pub log_to_file: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_interval")]
    pub retry_interval: u64,

    #[serde(default)]
    pub retry_jitter: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    #[serde(default = "default_true")]
    pub enable_alerts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bearer_token: None,
            base_url: None,
            sync_interval: default_sync_interval(),
            monitor_interval: default_monitor_interval(),
            health_check_interval: default_health_check_interval(),
            log_level: default_log_level(),
            log_to_file: true,
            log_dir: default_log_dir(),
            data_dir: default_data_dir(),
            max_retries: default_max_retries(),
            retry_interval: default_retry_interval(),
            retry_jitter: 0,
            batch_size: default_batch_size(),
            webhook_url: None,
            enable_alerts: true,
        }
    }
}

fn default_sync_interval() -> u64 {
    900
}
fn default_monitor_interval() -> u64 {
    300
}
fn default_health_check_interval() -> u64 {
    600
}
fn default_log_level() -> String {
    "INFO".into()
}
fn default_true() -> bool {
    true
}
fn default_log_dir() -> PathBuf {
    "logs".into()
}
fn default_data_dir() -> PathBuf {
    "data".into()
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_interval() -> u64 {
    60
}
fn default_batch_size() -> u32 {
    200
}

impl Settings {
    /// Parsed log level, rejecting anything outside the four names.
    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        self.log_level.parse().map_err(|_| ConfigError::Validation {
            field: "log_level".into(),
            reason: format!(
                "expected DEBUG, INFO, WARNING or ERROR, got '{}'",
                self.log_level
            ),
        })
    }

    /// Validate and convert into the agent's runtime config.
    pub fn to_agent_config(&self) -> Result<AgentConfig, ConfigError> {
        let token = self
            .bearer_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let webhook_url = self
            .webhook_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|raw| {
                raw.parse::<url::Url>().map_err(|e| ConfigError::Validation {
                    field: "webhook_url".into(),
                    reason: format!("invalid URL '{raw}': {e}"),
                })
            })
            .transpose()?;

        let config = AgentConfig {
            bearer_token: SecretString::from(token.to_owned()),
            base_url: self.base_url.clone(),
            sync_interval: Duration::from_secs(self.sync_interval),
            monitor_interval: Duration::from_secs(self.monitor_interval),
            health_check_interval: Duration::from_secs(self.health_check_interval),
            log_level: self.log_level()?,
            log_to_file: self.log_to_file,
            log_dir: self.log_dir.clone(),
            data_dir: self.data_dir.clone(),
            max_retries: self.max_retries,
            retry_interval: Duration::from_secs(self.retry_interval),
            retry_jitter: Duration::from_secs(self.retry_jitter),
            batch_size: self.batch_size,
            webhook_url,
            enable_alerts: self.enable_alerts,
        };
        config.validate()?;
        Ok(config)
    }

    /// The settings with the token masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            bearer_token: self.bearer_token.as_ref().map(|_| REDACTED.to_owned()),
            ..self.clone()
        }
    }

    /// Pretty TOML of [`redacted`](Self::redacted).
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self.redacted())?)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Platform config file location, e.g. `~/.config/wfrmls/config.toml`.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "wfrmls", "wfrmls").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wfrmls");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Layer defaults, the TOML file (if present) and `WFRMLS_*` variables.
///
/// `path` overrides [`config_path`]. A missing file is not an error.
pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let settings = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;
    Ok(settings)
}

/// [`load`] then [`Settings::to_agent_config`].
pub fn load_agent_config(path: Option<&Path>) -> Result<AgentConfig, ConfigError> {
    load(path)?.to_agent_config()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn with_token() -> Settings {
        Settings {
            bearer_token: Some("abc".into()),
            ..Settings::default()
        }
    }

    #[test]
    fn defaults_without_file_or_env() {
        Jail::expect_with(|jail| {
            let settings =
                load(Some(&jail.directory().join("missing.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(settings, Settings::default());
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "wfrmls.toml",
                r#"
                    bearer_token = "from-file"
                    sync_interval = 120
                    log_level = "debug"
                "#,
            )?;
            jail.set_env("WFRMLS_SYNC_INTERVAL", "300");
            jail.set_env("WFRMLS_WEBHOOK_URL", "https://hooks.example.com/x");

            let settings = load(Some(Path::new("wfrmls.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(settings.sync_interval, 300);
            assert_eq!(settings.bearer_token.as_deref(), Some("from-file"));

            let config = settings.to_agent_config().map_err(|e| e.to_string())?;
            assert_eq!(config.sync_interval, Duration::from_secs(300));
            assert_eq!(config.log_level, LogLevel::Debug);
            assert_eq!(config.bearer_token.expose_secret(), "from-file");
            assert_eq!(
                config.webhook_url.map(String::from).as_deref(),
                Some("https://hooks.example.com/x")
            );
            Ok(())
        });
    }

    #[test]
    fn token_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("WFRMLS_BEARER_TOKEN", "env-token");
            let config =
                load_agent_config(Some(Path::new("none.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.bearer_token.expose_secret(), "env-token");
            Ok(())
        });
    }

    #[test]
    fn missing_token_is_rejected() {
        assert!(matches!(
            Settings::default().to_agent_config(),
            Err(ConfigError::MissingToken)
        ));
    }

    #[test]
    fn validation_errors_name_the_field() {
        let settings = Settings {
            monitor_interval: 10,
            ..with_token()
        };
        match settings.to_agent_config() {
            Err(ConfigError::Validation { field, .. }) => assert_eq!(field, "monitor_interval"),
            other => panic!("expected validation error, got {other:?}"),
        }

        let settings = Settings {
            log_level: "verbose".into(),
            ..with_token()
        };
        assert!(matches!(
            settings.to_agent_config(),
            Err(ConfigError::Validation { field, .. }) if field == "log_level"
        ));

        let settings = Settings {
            webhook_url: Some("ftp://example.com".into()),
            ..with_token()
        };
        assert!(matches!(
            settings.to_agent_config(),
            Err(ConfigError::Validation { field, .. }) if field == "webhook_url"
        ));
    }

    #[test]
    fn redacted_toml_hides_token() {
        let rendered = with_token().to_redacted_toml().unwrap();
        assert!(rendered.contains("bearer_token = \"********\""));
        assert!(!rendered.contains("abc"));
        assert!(rendered.contains("sync_interval = 900"));
    }

    #[test]
    fn config_path_ends_with_file_name() {
        assert!(config_path().ends_with("config.toml"));
    }
}
