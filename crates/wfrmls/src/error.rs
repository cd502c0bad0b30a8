//! CLI error types with miette diagnostics.
//!
//! Library errors are folded into a handful of user-facing variants, each
//! with a stable exit code and a hint for what to try next.

use miette::Diagnostic;
use thiserror::Error;

use wfrmls_config::ConfigError;
use wfrmls_core::{AnalyticsError, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const RATE_LIMITED: i32 = 8;
    pub const CONFIG: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the WFRMLS API")]
    #[diagnostic(
        code(wfrmls::connection_failed),
        help("Check network access and --base-url.\n{message}")
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(wfrmls::auth_failed),
        help("Pass --token, set WFRMLS_BEARER_TOKEN, or add bearer_token to the config file.")
    )]
    AuthFailed { message: String },

    // ── Remote outcomes ──────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(wfrmls::not_found),
        help("Run: wfrmls list {resource} to see available keys")
    )]
    NotFound { message: String, resource: String },

    #[error("{message}")]
    #[diagnostic(
        code(wfrmls::rate_limited),
        help("The API is throttling this token. Wait and retry.")
    )]
    RateLimited { message: String },

    /// Includes 400s, which usually mean a malformed `--filter`.
    #[error("{message}")]
    #[diagnostic(code(wfrmls::api_error))]
    Api { message: String, status: Option<u16> },

    #[error("{message}")]
    #[diagnostic(code(wfrmls::no_data))]
    NoData { message: String },

    // ── Usage ────────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(wfrmls::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(wfrmls::config),
        help("Inspect the effective settings with: wfrmls config show")
    )]
    Config(#[from] ConfigError),

    #[error("Failed to initialise logging: {0}")]
    #[diagnostic(code(wfrmls::logging))]
    Logging(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(wfrmls::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(wfrmls::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::RateLimited { .. } => exit_code::RATE_LIMITED,
            Self::Validation { .. } | Self::Api { status: Some(400), .. } => exit_code::USAGE,
            Self::Config(ConfigError::MissingToken) => exit_code::AUTH,
            Self::Config(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the resource name used in the not-found hint.
    pub fn for_resource(self, resource: &str) -> Self {
        match self {
            Self::NotFound { message, .. } => Self::NotFound {
                message,
                resource: resource.to_owned(),
            },
            other => other,
        }
    }
}

// ── Library error → CliError mapping ─────────────────────────────────

impl From<wfrmls_api::Error> for CliError {
    fn from(err: wfrmls_api::Error) -> Self {
        let status = err.status_code();
        let message = err.to_string();
        match err {
            wfrmls_api::Error::Authentication { .. } | wfrmls_api::Error::Header(_) => {
                Self::AuthFailed { message }
            }
            wfrmls_api::Error::NotFound { .. } => Self::NotFound {
                message,
                resource: "<resource>".into(),
            },
            wfrmls_api::Error::RateLimited { .. } => Self::RateLimited { message },
            wfrmls_api::Error::Network { .. } => Self::ConnectionFailed { message },
            _ => Self::Api { message, status },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::ConnectionFailed { message } => Self::ConnectionFailed { message },
            CoreError::NotFound { message } => Self::NotFound {
                message,
                resource: "<resource>".into(),
            },
            CoreError::RateLimited { message } => Self::RateLimited { message },
            CoreError::Api { message, status } => Self::Api { message, status },
            CoreError::InvalidConfig { field, reason } => Self::Config(ConfigError::Validation {
                field: field.into(),
                reason,
            }),
            other => Self::Api {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<AnalyticsError> for CliError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Api(e) => e.into(),
            no_data @ AnalyticsError::NoData { .. } => Self::NoData {
                message: no_data.to_string(),
            },
        }
    }
}
