use serde_json::Value;
use thiserror::Error;

/// Top-level error type for the `wfrmls-api` crate.
///
/// Every HTTP failure carries the status code and the raw response body so
/// callers can inspect what the server actually said. The client layer never
/// retries; `wfrmls-core` decides what to do with these.
#[derive(Debug, Error)]
pub enum Error {
    // ── Request shape ───────────────────────────────────────────────
    /// 400: the server rejected the query (bad `$filter`, unknown field, ...).
    #[error("{message}")]
    Validation {
        message: String,
        status: u16,
        body: Value,
    },

    // ── Authentication ──────────────────────────────────────────────
    /// 401, or no bearer token available at construction time.
    ///
    /// `status` and `body` are `None` when the error was raised locally
    /// before any request went out.
    #[error("{message}")]
    Authentication {
        message: String,
        status: Option<u16>,
        body: Option<Value>,
    },

    /// Token could not be encoded as an `Authorization` header value.
    #[error("Invalid bearer token: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    // ── Remote outcomes ─────────────────────────────────────────────
    /// 404: the entity set or key does not exist.
    #[error("{message}")]
    NotFound {
        message: String,
        status: u16,
        body: Value,
    },

    /// 429: the API is throttling this token.
    #[error("{message}")]
    RateLimited {
        message: String,
        status: u16,
        body: Value,
    },

    /// 500-599.
    #[error("{message}")]
    Server {
        message: String,
        status: u16,
        body: Value,
    },

    /// Any status outside the documented table.
    #[error("{message}")]
    Unexpected {
        message: String,
        status: u16,
        body: Value,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// Connection refused, DNS failure, timeout, TLS failure.
    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client could not be constructed (bad CA file, TLS backend).
    #[error("Transport setup failed: {0}")]
    Transport(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON did not fit the expected OData envelope, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl From<reqwest::Error> for Error {
    fn from(source: reqwest::Error) -> Self {
        Self::Network {
            message: format!("Network error: {source}"),
            source,
        }
    }
}

impl Error {
    /// HTTP status that produced this error, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Validation { status, .. }
            | Self::NotFound { status, .. }
            | Self::RateLimited { status, .. }
            | Self::Server { status, .. }
            | Self::Unexpected { status, .. } => Some(*status),
            Self::Authentication { status, .. } => *status,
            Self::Network { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw JSON body the server sent with the failure.
    pub fn response_body(&self) -> Option<&Value> {
        match self {
            Self::Validation { body, .. }
            | Self::NotFound { body, .. }
            | Self::RateLimited { body, .. }
            | Self::Server { body, .. }
            | Self::Unexpected { body, .. } => Some(body),
            Self::Authentication { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Returns `true` if a later attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { source, .. } => source.is_timeout() || source.is_connect(),
            Self::RateLimited { .. } | Self::Server { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for missing or rejected credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Header(_))
    }
}
