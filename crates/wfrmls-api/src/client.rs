// Async HTTP client for the WFRMLS RESO OData service.
//
// Base path: https://resoapi.utahrealestate.com/reso/odata
// Auth: Authorization: Bearer <token>

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Production OData root.
pub const DEFAULT_BASE_URL: &str = "https://resoapi.utahrealestate.com/reso/odata";

/// Environment variable consulted when no token is passed explicitly.
pub const TOKEN_ENV_VAR: &str = "WFRMLS_BEARER_TOKEN";

// ── Client ───────────────────────────────────────────────────────────

/// Shared GET wrapper used by every resource client.
///
/// Holds one `reqwest::Client` with the bearer token baked into its
/// default headers. Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct BaseClient {
    http: reqwest::Client,
    base_url: String,
}

impl BaseClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build with the default transport, resolving the token from the
    /// argument or `WFRMLS_BEARER_TOKEN`.
    ///
    /// Fails with [`Error::Authentication`] before any request if neither
    /// is set.
    pub fn new(token: Option<SecretString>, base_url: Option<&str>) -> Result<Self, Error> {
        Self::with_transport(token, base_url, &TransportConfig::default())
    }

    pub fn with_transport(
        token: Option<SecretString>,
        base_url: Option<&str>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let token = resolve_token(token, |name| std::env::var(name).ok())?;
        Self::from_token(&token, base_url.unwrap_or(DEFAULT_BASE_URL), transport)
    }

    /// Build from an already-resolved token.
    pub fn from_token(
        token: &SecretString,
        base_url: &str,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        let base_url = normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// `{base_url}/{endpoint}`
    fn url(&self, endpoint: &str) -> Result<Url, Error> {
        let endpoint = endpoint.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{endpoint}", self.base_url))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    /// GET `endpoint` with OData query parameters and return the decoded payload.
    pub async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, Error> {
        let url = self.url(endpoint)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        interpret_response(status, &body)
    }

    /// GET and deserialize into `T`, keeping the raw body on mismatch.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let value = self.get(endpoint, params).await?;
        T::deserialize(&value).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: value.to_string(),
        })
    }

    /// Fetch the service's CSDL document (`$metadata`) as XML text.
    pub async fn get_metadata(&self) -> Result<String, Error> {
        let url = self.url("$metadata")?;
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .header(ACCEPT, "application/xml")
            .header(CONTENT_TYPE, "application/xml")
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;

        match status {
            200 | 201 => Ok(String::from_utf8_lossy(&body).into_owned()),
            _ => interpret_response(status, &body).map(|_| String::new()),
        }
    }
}

fn normalize_base_url(raw: &str) -> Result<String, Error> {
    let url = Url::parse(raw.trim())?;
    Ok(url.as_str().trim_end_matches('/').to_owned())
}

// ── Credential resolution ────────────────────────────────────────────

/// Explicit token wins; otherwise ask `env` for [`TOKEN_ENV_VAR`].
/// Empty strings count as absent.
pub(crate) fn resolve_token(
    explicit: Option<SecretString>,
    env: impl FnOnce(&str) -> Option<String>,
) -> Result<SecretString, Error> {
    if let Some(token) = explicit.filter(|t| !t.expose_secret().trim().is_empty()) {
        return Ok(token);
    }
    env(TOKEN_ENV_VAR)
        .filter(|t| !t.trim().is_empty())
        .map(SecretString::from)
        .ok_or_else(|| Error::Authentication {
            message: format!(
                "Bearer token is required. Pass one explicitly or set the \
                 {TOKEN_ENV_VAR} environment variable."
            ),
            status: None,
            body: None,
        })
}

// ── Response handling ────────────────────────────────────────────────

/// Map an HTTP status and body to a payload or a typed error.
///
/// Pure function of its inputs; every HTTP call in the crate ends here.
pub fn interpret_response(status: u16, body: &[u8]) -> Result<Value, Error> {
    if status == 204 {
        return Ok(Value::Object(Map::new()));
    }

    let payload = parse_body(body);
    match status {
        200 | 201 => Ok(payload),
        400 => Err(Error::Validation {
            message: format!("Bad request: {}", extract_message(&payload, "Invalid request")),
            status,
            body: payload,
        }),
        401 => Err(Error::Authentication {
            message: format!(
                "Authentication failed: {}",
                extract_message(&payload, "Invalid credentials")
            ),
            status: Some(status),
            body: Some(payload),
        }),
        404 => Err(Error::NotFound {
            message: format!("Resource not found: {}", extract_message(&payload, "Not found")),
            status,
            body: payload,
        }),
        429 => Err(Error::RateLimited {
            message: format!(
                "Rate limit exceeded: {}",
                extract_message(&payload, "Too many requests")
            ),
            status,
            body: payload,
        }),
        500..=599 => Err(Error::Server {
            message: format!(
                "Server error: {}",
                extract_message(&payload, "Internal server error")
            ),
            status,
            body: payload,
        }),
        _ => Err(Error::Unexpected {
            message: format!("Unexpected error: {}", extract_message(&payload, "Unknown error")),
            status,
            body: payload,
        }),
    }
}

/// JSON if it parses, `{}` if empty, otherwise `{"message": <text>}`.
fn parse_body(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Object(Map::new());
    }
    serde_json::from_slice(body).unwrap_or_else(|_| {
        let mut map = Map::new();
        map.insert(
            "message".into(),
            Value::String(String::from_utf8_lossy(body).into_owned()),
        );
        Value::Object(map)
    })
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// `message`, then `error.message`, then `default`.
fn extract_message(payload: &Value, default: &str) -> String {
    let Ok(envelope) = ErrorEnvelope::deserialize(payload) else {
        return default.to_owned();
    };

    envelope
        .message
        .as_ref()
        .and_then(message_text)
        .or_else(|| {
            envelope
                .error
                .as_ref()
                .and_then(|e| e.get("message"))
                .and_then(message_text)
        })
        .unwrap_or_else(|| default.to_owned())
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_token_fails_before_any_request() {
        let err = resolve_token(None, |_| None).unwrap_err();
        assert!(
            matches!(
                err,
                Error::Authentication {
                    status: None,
                    body: None,
                    ..
                }
            ),
            "expected local auth error, got {err:?}"
        );
        assert!(err.to_string().contains(TOKEN_ENV_VAR));
    }

    #[test]
    fn explicit_token_beats_environment() {
        let token = resolve_token(Some(SecretString::from("explicit")), |_| {
            Some("from-env".into())
        })
        .unwrap();
        assert_eq!(token.expose_secret(), "explicit");
    }

    #[test]
    fn environment_token_used_when_no_argument() {
        let token = resolve_token(None, |name| {
            assert_eq!(name, TOKEN_ENV_VAR);
            Some("from-env".into())
        })
        .unwrap();
        assert_eq!(token.expose_secret(), "from-env");
    }

    #[test]
    fn empty_tokens_count_as_absent() {
        let result = resolve_token(Some(SecretString::from("")), |_| Some(String::new()));
        assert!(matches!(result, Err(Error::Authentication { .. })));
    }

    #[test]
    fn success_returns_parsed_json() {
        let value = interpret_response(200, br#"{"value": [{"ListingKey": "1"}]}"#).unwrap();
        assert_eq!(value, json!({"value": [{"ListingKey": "1"}]}));

        let value = interpret_response(201, br#"{"ok": true}"#).unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn non_json_success_is_wrapped() {
        assert_eq!(
            interpret_response(200, b"hello").unwrap(),
            json!({"message": "hello"})
        );
    }

    #[test]
    fn empty_success_body_is_empty_object() {
        assert_eq!(interpret_response(200, b"").unwrap(), json!({}));
    }

    #[test]
    fn no_content_is_empty_object() {
        assert_eq!(interpret_response(204, b"").unwrap(), json!({}));
        assert_eq!(interpret_response(204, b"ignored").unwrap(), json!({}));
    }

    #[test]
    fn status_table_maps_to_variants_and_prefixes() {
        let cases: &[(u16, &str)] = &[
            (400, "Bad request:"),
            (401, "Authentication failed:"),
            (404, "Resource not found:"),
            (429, "Rate limit exceeded:"),
            (500, "Server error:"),
            (503, "Server error:"),
            (418, "Unexpected error:"),
        ];
        for &(status, prefix) in cases {
            let err = interpret_response(status, br#"{"message": "nope"}"#).unwrap_err();
            assert!(
                err.to_string().starts_with(prefix),
                "{status}: {err} should start with {prefix}"
            );
            assert_eq!(err.status_code(), Some(status));
            assert_eq!(err.response_body(), Some(&json!({"message": "nope"})));
        }

        assert!(matches!(
            interpret_response(400, b"{}"),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            interpret_response(401, b"{}"),
            Err(Error::Authentication { .. })
        ));
        assert!(matches!(
            interpret_response(404, b"{}"),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            interpret_response(429, b"{}"),
            Err(Error::RateLimited { .. })
        ));
        assert!(matches!(
            interpret_response(502, b"{}"),
            Err(Error::Server { .. })
        ));
        assert!(matches!(
            interpret_response(302, b"{}"),
            Err(Error::Unexpected { .. })
        ));
    }

    #[test]
    fn message_extraction_order() {
        let err = interpret_response(400, br#"{"message": "top", "error": {"message": "nested"}}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "Bad request: top");

        let err = interpret_response(400, br#"{"error": {"code": "X", "message": "nested"}}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "Bad request: nested");

        let err = interpret_response(400, b"{}").unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Invalid request");
    }

    #[test]
    fn defaults_per_status() {
        let cases: &[(u16, &str)] = &[
            (401, "Authentication failed: Invalid credentials"),
            (404, "Resource not found: Not found"),
            (429, "Rate limit exceeded: Too many requests"),
            (500, "Server error: Internal server error"),
            (409, "Unexpected error: Unknown error"),
        ];
        for &(status, expected) in cases {
            assert_eq!(interpret_response(status, b"").unwrap_err().to_string(), expected);
        }
    }

    #[test]
    fn plain_text_error_body_becomes_message() {
        let err = interpret_response(503, b"upstream down").unwrap_err();
        assert_eq!(err.to_string(), "Server error: upstream down");
        assert_eq!(err.response_body(), Some(&json!({"message": "upstream down"})));
    }

    #[test]
    fn base_url_trailing_slash_is_normalised() {
        assert_eq!(
            normalize_base_url("https://example.test/reso/odata/").unwrap(),
            "https://example.test/reso/odata"
        );
        assert!(normalize_base_url("not a url").is_err());
    }
}
