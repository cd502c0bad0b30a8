// Outbound JSON notifications.
//
// Best-effort: failures are logged and swallowed so a dead receiver never
// stalls the loop that produced the event.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, warn};
use url::Url;

use wfrmls_api::TransportConfig;

use crate::error::CoreError;

pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a single post, for callers that want to count them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Rejected(u16),
    Failed,
}

#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(url: Url) -> Result<Self, CoreError> {
        let http = TransportConfig::default()
            .with_timeout(WEBHOOK_TIMEOUT)
            .build_client()?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// POST `payload` as JSON. Non-2xx responses are not retried.
    pub async fn post<T: Serialize + Sync>(&self, payload: &T) -> Delivery {
        match self.http.post(self.url.clone()).json(payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(url = %self.url, "webhook delivered");
                Delivery::Delivered
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                warn!(url = %self.url, status, "webhook rejected");
                Delivery::Rejected(status)
            }
            Err(e) => {
                error!(url = %self.url, error = %e, "webhook delivery failed");
                Delivery::Failed
            }
        }
    }
}
