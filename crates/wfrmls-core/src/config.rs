// ── Runtime agent configuration ──
//
// Built once by the binary (via wfrmls-config) and handed to every agent
// component. Nothing in this crate reads the environment or touches the
// config file.

use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use url::Url;

use crate::error::CoreError;

pub const MIN_SYNC_INTERVAL_SECS: u64 = 60;
pub const MIN_MONITOR_INTERVAL_SECS: u64 = 30;
pub const MIN_HEALTH_CHECK_INTERVAL_SECS: u64 = 60;
pub const MAX_BATCH_SIZE: u32 = 1000;

/// Agent log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

/// Everything the background agent needs.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub bearer_token: SecretString,
    /// API root; `None` uses the production endpoint.
    pub base_url: Option<String>,
    pub sync_interval: Duration,
    pub monitor_interval: Duration,
    pub health_check_interval: Duration,
    pub log_level: LogLevel,
    pub log_to_file: bool,
    pub log_dir: PathBuf,
    pub data_dir: PathBuf,
    pub max_retries: u32,
    pub retry_interval: Duration,
    pub retry_jitter: Duration,
    /// `$top` used by the data sync loop.
    pub batch_size: u32,
    pub webhook_url: Option<Url>,
    pub enable_alerts: bool,
}

impl AgentConfig {
    /// Defaults for everything except the token.
    pub fn new(bearer_token: SecretString) -> Self {
        Self {
            bearer_token,
            base_url: None,
            sync_interval: Duration::from_secs(900),
            monitor_interval: Duration::from_secs(300),
            health_check_interval: Duration::from_secs(600),
            log_level: LogLevel::Info,
            log_to_file: true,
            log_dir: PathBuf::from("logs"),
            data_dir: PathBuf::from("data"),
            max_retries: 3,
            retry_interval: Duration::from_secs(60),
            retry_jitter: Duration::ZERO,
            batch_size: 200,
            webhook_url: None,
            enable_alerts: true,
        }
    }

    /// Check interval floors, batch bounds and the webhook scheme.
    pub fn validate(&self) -> Result<(), CoreError> {
        check_min("sync_interval", self.sync_interval, MIN_SYNC_INTERVAL_SECS)?;
        check_min(
            "monitor_interval",
            self.monitor_interval,
            MIN_MONITOR_INTERVAL_SECS,
        )?;
        check_min(
            "health_check_interval",
            self.health_check_interval,
            MIN_HEALTH_CHECK_INTERVAL_SECS,
        )?;

        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(CoreError::InvalidConfig {
                field: "batch_size",
                reason: format!("must be between 1 and {MAX_BATCH_SIZE}, got {}", self.batch_size),
            });
        }

        if let Some(url) = &self.webhook_url {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(CoreError::InvalidConfig {
                    field: "webhook_url",
                    reason: format!("must be an http(s) URL, got scheme '{}'", url.scheme()),
                });
            }
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            interval: self.retry_interval,
            jitter: self.retry_jitter,
            max_retries: self.max_retries,
        }
    }
}

fn check_min(field: &'static str, value: Duration, min_secs: u64) -> Result<(), CoreError> {
    if value.as_secs() < min_secs {
        return Err(CoreError::InvalidConfig {
            field,
            reason: format!("must be at least {min_secs} seconds, got {}", value.as_secs()),
        });
    }
    Ok(())
}

// ── Retry policy ─────────────────────────────────────────────────────

/// Delay between failed loop iterations.
///
/// Fixed interval plus optional uniform jitter; there is no backoff
/// growth. Once `max_retries` consecutive failures have been retried the
/// loop falls back to its regular cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub jitter: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            jitter: Duration::ZERO,
            max_retries: 3,
        }
    }
}

/// What a loop should do after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after this delay.
    Retry(Duration),
    /// Out of retries: wait the loop's normal cadence.
    GiveUp,
}

impl RetryPolicy {
    /// Decision after the `failures`-th consecutive failure (1-based).
    pub fn after_failure(&self, failures: u32) -> RetryDecision {
        if failures <= self.max_retries {
            RetryDecision::Retry(self.delay())
        } else {
            RetryDecision::GiveUp
        }
    }

    /// `interval + U(0, jitter)`.
    pub fn delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.interval;
        }
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = rand::rng().random_range(0..=jitter_ms);
        self.interval + Duration::from_millis(extra)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn config() -> AgentConfig {
        AgentConfig::new(SecretString::from("token"))
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = config();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.sync_interval, Duration::from_secs(900));
        assert_eq!(cfg.batch_size, 200);
        assert_eq!(cfg.log_level, LogLevel::Info);
    }

    #[test]
    fn interval_floors_are_enforced() {
        let mut cfg = config();
        cfg.sync_interval = Duration::from_secs(59);
        assert!(matches!(
            cfg.validate(),
            Err(CoreError::InvalidConfig { field: "sync_interval", .. })
        ));

        let mut cfg = config();
        cfg.monitor_interval = Duration::from_secs(29);
        assert!(matches!(
            cfg.validate(),
            Err(CoreError::InvalidConfig { field: "monitor_interval", .. })
        ));

        let mut cfg = config();
        cfg.health_check_interval = Duration::from_secs(30);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn batch_size_bounds() {
        let mut cfg = config();
        cfg.batch_size = 0;
        assert!(cfg.validate().is_err());
        cfg.batch_size = 1001;
        assert!(cfg.validate().is_err());
        cfg.batch_size = 1000;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn webhook_must_be_http() {
        let mut cfg = config();
        cfg.webhook_url = Some(Url::parse("ftp://hooks.example.com/x").unwrap());
        assert!(matches!(
            cfg.validate(),
            Err(CoreError::InvalidConfig { field: "webhook_url", .. })
        ));
        cfg.webhook_url = Some(Url::parse("https://hooks.example.com/x").unwrap());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Warning.as_filter(), "warn");
        assert_eq!(LogLevel::Warning.to_string(), "WARNING");
    }

    #[test]
    fn retry_policy_retries_then_gives_up() {
        let policy = RetryPolicy::default();
        for k in 1..=3 {
            assert_eq!(
                policy.after_failure(k),
                RetryDecision::Retry(Duration::from_secs(60))
            );
        }
        assert_eq!(policy.after_failure(4), RetryDecision::GiveUp);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            interval: Duration::from_secs(10),
            jitter: Duration::from_secs(5),
            max_retries: 1,
        };
        for _ in 0..50 {
            let delay = policy.delay();
            assert!(delay >= Duration::from_secs(10));
            assert!(delay <= Duration::from_secs(15));
        }
    }
}
