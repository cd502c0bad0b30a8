// ── Core error types ──
//
// Errors surfaced by the agent and analytics layers. API failures are
// folded into a smaller set of variants through `From<wfrmls_api::Error>`
// so callers can branch on what happened without matching on HTTP codes.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── API outcomes ─────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Cannot reach the WFRMLS API: {message}")]
    ConnectionFailed { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code, if a response was received.
        status: Option<u16>,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    // ── Local side effects ───────────────────────────────────────────
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Scheduled task '{name}' failed: {reason}")]
    Task { name: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ── Conversion from API errors ───────────────────────────────────────

impl From<wfrmls_api::Error> for CoreError {
    fn from(err: wfrmls_api::Error) -> Self {
        let status = err.status_code();
        let message = err.to_string();
        match err {
            wfrmls_api::Error::Authentication { .. } | wfrmls_api::Error::Header(_) => {
                Self::AuthenticationFailed { message }
            }
            wfrmls_api::Error::Network { .. } => Self::ConnectionFailed { message },
            wfrmls_api::Error::NotFound { .. } => Self::NotFound { message },
            wfrmls_api::Error::RateLimited { .. } => Self::RateLimited { message },
            _ => Self::Api { message, status },
        }
    }
}
