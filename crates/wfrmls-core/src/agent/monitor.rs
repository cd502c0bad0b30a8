// API health and data-quality monitoring with alerting.
//
// Metrics live in memory only: a rolling window of response times,
// success/error counters and a capped alert history.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use wfrmls_api::{ODataQuery, Record, WfrmlsClient};

use super::webhook::WebhookNotifier;
use crate::stats::{ratio, to_f64};

pub const AGENT_ID: &str = "wfrmls-agent";

const LATENCY_WINDOW: usize = 100;
const ALERT_HISTORY_CAP: usize = 1000;
const RECENT_SAMPLE_COUNT: usize = 10;
const SLOW_RESPONSE: Duration = Duration::from_secs(30);
const SLOW_AVERAGE: Duration = Duration::from_secs(15);
const MAX_ERROR_RATE: f64 = 0.1;
const MAX_VALID_PRICE: f64 = 50_000_000.0;
const QUALITY_SAMPLE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub severity: Severity,
    pub agent_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStatus {
    pub last_health_check: Option<DateTime<Utc>>,
    pub total_requests: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub error_rate: f64,
    /// Mean of the latency window, in seconds.
    pub average_response_time: f64,
    /// Alerts raised in the last 24 hours.
    pub recent_alerts: usize,
    pub status: HealthState,
}

/// Counts from one data-quality pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QualityFindings {
    pub checked: usize,
    pub missing_required: usize,
    pub invalid_prices: usize,
}

/// Records missing `ListingId`/`StandardStatus` or priced outside `0..=50M`.
pub fn assess_quality(records: &[Record]) -> QualityFindings {
    let present = |r: &Record, field: &str| match r.get(field) {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    };

    let mut findings = QualityFindings {
        checked: records.len(),
        ..QualityFindings::default()
    };
    for record in records {
        if !present(record, "ListingId") || !present(record, "StandardStatus") {
            findings.missing_required += 1;
        }
        if let Some(price) = record.get("ListPrice").and_then(serde_json::Value::as_f64) {
            if !(0.0..=MAX_VALID_PRICE).contains(&price) {
                findings.invalid_prices += 1;
            }
        }
    }
    findings
}

// ── Monitor ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Metrics {
    response_times: VecDeque<Duration>,
    success_count: u64,
    error_count: u64,
    last_health_check: Option<DateTime<Utc>>,
}

impl Metrics {
    fn total_requests(&self) -> u64 {
        self.success_count + self.error_count
    }

    fn error_rate(&self) -> f64 {
        let total = usize::try_from(self.total_requests()).unwrap_or(usize::MAX);
        let errors = usize::try_from(self.error_count).unwrap_or(usize::MAX);
        ratio(errors, total)
    }

    fn average_response_time(&self) -> f64 {
        if self.response_times.is_empty() {
            return 0.0;
        }
        self.response_times.iter().sum::<Duration>().as_secs_f64()
            / to_f64(self.response_times.len())
    }

    /// Mean of the newest ten samples, once ten exist.
    fn recent_average(&self) -> Option<f64> {
        if self.response_times.len() < RECENT_SAMPLE_COUNT {
            return None;
        }
        let recent: Duration = self.response_times.iter().rev().take(RECENT_SAMPLE_COUNT).sum();
        Some(recent.as_secs_f64() / to_f64(RECENT_SAMPLE_COUNT))
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    metrics: Metrics,
    alerts: VecDeque<Alert>,
}

/// Shared by the monitoring loop and status readers. The state lock is
/// only taken for in-memory updates, never across an HTTP call.
#[derive(Debug)]
pub struct DataMonitor {
    client: Arc<WfrmlsClient>,
    webhook: Option<WebhookNotifier>,
    enable_alerts: bool,
    state: Mutex<MonitorState>,
}

impl DataMonitor {
    pub fn new(
        client: Arc<WfrmlsClient>,
        webhook: Option<WebhookNotifier>,
        enable_alerts: bool,
    ) -> Self {
        Self {
            client,
            webhook,
            enable_alerts,
            state: Mutex::new(MonitorState::default()),
        }
    }

    /// One full monitoring pass.
    pub async fn check_alerts(&self, now: DateTime<Utc>) {
        self.check_api_health(now).await;
        self.check_data_quality(now).await;
        self.check_error_rate(now).await;
        self.check_response_times(now).await;
    }

    /// Time a 1-record property list. Returns whether it succeeded.
    pub async fn check_api_health(&self, now: DateTime<Utc>) -> bool {
        let started = Instant::now();
        let result = self.client.property().list(&ODataQuery::new().top(1)).await;
        let elapsed = started.elapsed();

        match result {
            Ok(_) => {
                self.record_success(elapsed).await;
                self.state.lock().await.metrics.last_health_check = Some(now);
                if elapsed > SLOW_RESPONSE {
                    self.create_alert(
                        "slow_api_response",
                        format!(
                            "API response time: {:.2}s exceeds {}s threshold",
                            elapsed.as_secs_f64(),
                            SLOW_RESPONSE.as_secs()
                        ),
                        Severity::Warning,
                        now,
                    )
                    .await;
                }
                debug!(elapsed_ms = elapsed.as_millis(), "API health check passed");
                true
            }
            Err(e) => {
                self.record_failure().await;
                self.create_alert(
                    "api_error",
                    format!("API health check failed: {e}"),
                    Severity::Error,
                    now,
                )
                .await;
                false
            }
        }
    }

    /// Scan properties modified in the last hour.
    pub async fn check_data_quality(&self, now: DateTime<Utc>) {
        let since = now - TimeDelta::hours(1);
        let query = ODataQuery::new().top(QUALITY_SAMPLE);
        let page = match self.client.property().modified_since(since, query).await {
            Ok(page) => page,
            Err(e) => {
                error!(error = %e, "data quality check failed");
                return;
            }
        };

        let findings = assess_quality(&page.value);
        if findings.missing_required > 0 {
            self.create_alert(
                "data_quality",
                format!("{} properties missing required fields", findings.missing_required),
                Severity::Warning,
                now,
            )
            .await;
        }
        if findings.invalid_prices > 0 {
            self.create_alert(
                "data_quality",
                format!("{} properties with invalid prices", findings.invalid_prices),
                Severity::Warning,
                now,
            )
            .await;
        }
        debug!(checked = findings.checked, "data quality check completed");
    }

    pub async fn check_error_rate(&self, now: DateTime<Utc>) {
        let rate = self.state.lock().await.metrics.error_rate();
        if rate > MAX_ERROR_RATE {
            self.create_alert(
                "high_error_rate",
                format!("Error rate: {:.1}% exceeds 10% threshold", rate * 100.0),
                Severity::Error,
                now,
            )
            .await;
        }
    }

    pub async fn check_response_times(&self, now: DateTime<Utc>) {
        let Some(average) = self.state.lock().await.metrics.recent_average() else {
            return;
        };
        if average > SLOW_AVERAGE.as_secs_f64() {
            self.create_alert(
                "slow_performance",
                format!(
                    "Average API response time: {average:.2}s exceeds {}s threshold",
                    SLOW_AVERAGE.as_secs()
                ),
                Severity::Warning,
                now,
            )
            .await;
        }
    }

    // ── Metrics ──────────────────────────────────────────────────────

    pub async fn record_success(&self, elapsed: Duration) {
        let mut state = self.state.lock().await;
        let metrics = &mut state.metrics;
        metrics.success_count += 1;
        metrics.response_times.push_back(elapsed);
        while metrics.response_times.len() > LATENCY_WINDOW {
            metrics.response_times.pop_front();
        }
    }

    pub async fn record_failure(&self) {
        self.state.lock().await.metrics.error_count += 1;
    }

    // ── Alerts ───────────────────────────────────────────────────────

    /// Record, log and forward an alert. No-op when alerts are disabled.
    ///
    /// The alert is in the history before the webhook is attempted.
    pub async fn create_alert(
        &self,
        kind: &str,
        message: String,
        severity: Severity,
        now: DateTime<Utc>,
    ) {
        if !self.enable_alerts {
            return;
        }

        match severity {
            Severity::Info => info!(alert = kind, "ALERT: {message}"),
            Severity::Warning => warn!(alert = kind, "ALERT: {message}"),
            Severity::Error | Severity::Critical => error!(alert = kind, "ALERT: {message}"),
        }

        let alert = Alert {
            timestamp: now,
            kind: kind.to_owned(),
            message,
            severity,
            agent_id: AGENT_ID.to_owned(),
        };

        {
            let mut state = self.state.lock().await;
            let alerts = &mut state.alerts;
            alerts.push_back(alert.clone());
            while alerts.len() > ALERT_HISTORY_CAP {
                alerts.pop_front();
            }
        }

        if let Some(webhook) = &self.webhook {
            let payload = serde_json::json!({ "event_type": "alert", "alert": &alert });
            webhook.post(&payload).await;
        }
    }

    pub async fn recent_alerts(&self, now: DateTime<Utc>, hours: u32) -> Vec<Alert> {
        let cutoff = now - TimeDelta::hours(i64::from(hours));
        self.state
            .lock()
            .await
            .alerts
            .iter()
            .filter(|a| a.timestamp > cutoff)
            .cloned()
            .collect()
    }

    pub async fn alert_count(&self) -> usize {
        self.state.lock().await.alerts.len()
    }

    pub async fn system_status(&self, now: DateTime<Utc>) -> SystemStatus {
        let state = self.state.lock().await;
        let metrics = &state.metrics;
        let error_rate = metrics.error_rate();
        let average_response_time = metrics.average_response_time();
        let status = if error_rate < MAX_ERROR_RATE
            && average_response_time < SLOW_AVERAGE.as_secs_f64()
        {
            HealthState::Healthy
        } else {
            HealthState::Degraded
        };

        let cutoff = now - TimeDelta::hours(24);
        SystemStatus {
            last_health_check: metrics.last_health_check,
            total_requests: metrics.total_requests(),
            success_count: metrics.success_count,
            error_count: metrics.error_count,
            error_rate,
            average_response_time,
            recent_alerts: state.alerts.iter().filter(|a| a.timestamp > cutoff).count(),
            status,
        }
    }

    /// Clear counters, the latency window and alert history.
    pub async fn reset_metrics(&self) {
        *self.state.lock().await = MonitorState::default();
        info!("performance metrics and alert history reset");
    }
}
