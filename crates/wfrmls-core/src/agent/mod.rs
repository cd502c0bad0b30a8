// ── Background agent ──
//
// Polls the API on fixed intervals: incremental data sync, monitoring,
// scheduled maintenance and health checks each run as their own tokio
// task. All four share one cancellation token; `shutdown()` cancels it and
// joins them.

pub mod monitor;
pub mod processor;
pub mod scheduler;
pub mod webhook;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use wfrmls_api::{DateBound, ODataQuery, WfrmlsClient};

use crate::config::{AgentConfig, RetryDecision, RetryPolicy};
use crate::error::CoreError;
use monitor::{DataMonitor, SystemStatus};
use processor::DataProcessor;
use scheduler::{TaskScheduler, TaskStatus};
use webhook::WebhookNotifier;

/// How often the scheduler loop looks for due tasks.
pub const SCHEDULER_TICK: Duration = Duration::from_secs(60);

/// Per-resource counts from one data sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub since: String,
    pub properties: usize,
    pub members: usize,
    pub offices: usize,
    pub open_houses: usize,
    pub deletions: usize,
    /// Steps whose request failed.
    pub failures: usize,
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.properties + self.members + self.offices + self.open_houses + self.deletions
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub system: SystemStatus,
    pub tasks: Vec<TaskStatus>,
}

const SYNC_STEPS: usize = 5;

// ── Agent ────────────────────────────────────────────────────────────

/// Cheaply cloneable handle; clones share the same tasks and state.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    config: AgentConfig,
    client: Arc<WfrmlsClient>,
    processor: DataProcessor,
    monitor: DataMonitor,
    scheduler: Mutex<TaskScheduler>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Agent {
    /// Build the client and components. Does not contact the API.
    pub fn new(config: AgentConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let client = Arc::new(WfrmlsClient::new(
            Some(config.bearer_token.clone()),
            config.base_url.as_deref(),
        )?);
        let webhook = config
            .webhook_url
            .clone()
            .map(WebhookNotifier::new)
            .transpose()?;

        let processor = DataProcessor::new(&config.data_dir, webhook.clone());
        let monitor = DataMonitor::new(Arc::clone(&client), webhook, config.enable_alerts);
        let scheduler = TaskScheduler::with_default_tasks(&config, Utc::now());

        Ok(Self {
            inner: Arc::new(AgentInner {
                config,
                client,
                processor,
                monitor,
                scheduler: Mutex::new(scheduler),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &WfrmlsClient {
        &self.inner.client
    }

    pub fn processor(&self) -> &DataProcessor {
        &self.inner.processor
    }

    pub fn monitor(&self) -> &DataMonitor {
        &self.inner.monitor
    }

    pub fn scheduler(&self) -> &Mutex<TaskScheduler> {
        &self.inner.scheduler
    }

    /// Token cancelled by [`shutdown`](Self::shutdown).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Verify connectivity, then spawn the four background loops.
    ///
    /// A failed initial health check aborts start with that error.
    pub async fn start(&self) -> Result<(), CoreError> {
        info!("starting WFRMLS agent");
        self.health_check().await?;

        let cfg = &self.inner.config;
        let retry = cfg.retry_policy();
        let cancel = &self.inner.cancel;
        let mut handles = self.inner.task_handles.lock().await;

        let agent = self.clone();
        handles.push(tokio::spawn(run_loop(
            "data_sync",
            cfg.sync_interval,
            retry,
            cancel.clone(),
            move || {
                let agent = agent.clone();
                async move { agent.sync_once(Utc::now()).await.map(|_| ()) }
            },
        )));

        let agent = self.clone();
        handles.push(tokio::spawn(run_loop(
            "monitoring",
            cfg.monitor_interval,
            retry,
            cancel.clone(),
            move || {
                let agent = agent.clone();
                async move {
                    agent.inner.monitor.check_alerts(Utc::now()).await;
                    Ok(())
                }
            },
        )));

        let agent = self.clone();
        handles.push(tokio::spawn(run_loop(
            "scheduled_tasks",
            SCHEDULER_TICK,
            retry,
            cancel.clone(),
            move || {
                let agent = agent.clone();
                async move {
                    agent.inner.scheduler.lock().await.run_pending(Utc::now()).await;
                    Ok(())
                }
            },
        )));

        let agent = self.clone();
        handles.push(tokio::spawn(run_loop(
            "health_check",
            cfg.health_check_interval,
            retry,
            cancel.clone(),
            move || {
                let agent = agent.clone();
                async move { agent.health_check().await }
            },
        )));

        info!("all background tasks started");
        Ok(())
    }

    /// Cancel every loop and wait for them to finish.
    pub async fn shutdown(&self) {
        info!("stopping WFRMLS agent");
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }
        info!("WFRMLS agent stopped");
    }

    /// Metrics snapshot plus scheduler state.
    pub async fn status(&self, now: DateTime<Utc>) -> AgentStatus {
        AgentStatus {
            system: self.inner.monitor.system_status(now).await,
            tasks: self.inner.scheduler.lock().await.task_status(now),
        }
    }

    // ── Iterations ───────────────────────────────────────────────────

    /// A 1-record property list.
    pub async fn health_check(&self) -> Result<(), CoreError> {
        match self.inner.client.property().list(&ODataQuery::new().top(1)).await {
            Ok(_) => {
                info!("health check passed");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "health check failed");
                Err(e.into())
            }
        }
    }

    /// Pull everything modified in the last `sync_interval` and process it.
    ///
    /// Each step is independent; the pass fails only if all of them did.
    pub async fn sync_once(&self, now: DateTime<Utc>) -> Result<SyncReport, CoreError> {
        let started = Instant::now();
        let cfg = &self.inner.config;
        let client = &self.inner.client;
        let processor = &self.inner.processor;

        let window = TimeDelta::from_std(cfg.sync_interval).unwrap_or(TimeDelta::MAX);
        let cutoff = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let query = ODataQuery::new().top(cfg.batch_size);

        let mut report = SyncReport {
            since: DateBound::from(cutoff).to_odata(),
            ..SyncReport::default()
        };
        let mut first_error: Option<CoreError> = None;
        let mut fail = |step: &str, e: wfrmls_api::Error, report: &mut SyncReport| {
            error!(step, error = %e, "sync step failed");
            report.failures += 1;
            if first_error.is_none() {
                first_error = Some(e.into());
            }
        };

        match client.property().modified_since(cutoff, query.clone()).await {
            Ok(page) => {
                report.properties =
                    processed("properties", processor.process_properties(&page)).await;
            }
            Err(e) => fail("properties", e, &mut report),
        }
        match client.member().modified_since(cutoff, query.clone()).await {
            Ok(page) => {
                report.members = processed("members", processor.process_members(&page)).await;
            }
            Err(e) => fail("members", e, &mut report),
        }
        match client.office().modified_since(cutoff, query.clone()).await {
            Ok(page) => {
                report.offices = processed("offices", processor.process_offices(&page)).await;
            }
            Err(e) => fail("offices", e, &mut report),
        }
        match client.openhouse().modified_since(cutoff, query.clone()).await {
            Ok(page) => {
                report.open_houses =
                    processed("open houses", processor.process_open_houses(&page)).await;
            }
            Err(e) => fail("open houses", e, &mut report),
        }
        match client.deleted().since(cutoff, query).await {
            Ok(page) => {
                report.deletions = processed("deletions", processor.process_deletions(&page)).await;
            }
            Err(e) => fail("deletions", e, &mut report),
        }

        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if report.failures == SYNC_STEPS {
            return Err(
                first_error.unwrap_or_else(|| CoreError::Internal("data sync failed".into()))
            );
        }

        info!(
            total = report.total(),
            failures = report.failures,
            duration_ms = report.duration_ms,
            "data sync completed"
        );
        if report.total() > 0 {
            if let Ok(data) = serde_json::to_value(&report) {
                processor.send_webhook("data_sync", &data).await;
            }
        }
        Ok(report)
    }
}

async fn processed(what: &str, work: impl Future<Output = usize>) -> usize {
    let count = work.await;
    info!(count, "processed {what}");
    count
}

/// Shared shape of the four loops: run, then wait the cadence or the
/// retry delay, stopping as soon as `cancel` fires between iterations.
async fn run_loop<F, Fut>(
    name: &'static str,
    cadence: Duration,
    retry: RetryPolicy,
    cancel: CancellationToken,
    mut iteration: F,
) where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), CoreError>> + Send,
{
    info!(task = name, "loop started");
    let mut failures = 0_u32;

    while !cancel.is_cancelled() {
        let wait = match iteration().await {
            Ok(()) => {
                failures = 0;
                cadence
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                match retry.after_failure(failures) {
                    RetryDecision::Retry(delay) => {
                        warn!(
                            task = name,
                            attempt = failures,
                            error = %e,
                            "iteration failed, retrying in {}s",
                            delay.as_secs()
                        );
                        delay
                    }
                    RetryDecision::GiveUp => {
                        error!(
                            task = name,
                            failures,
                            error = %e,
                            "retries exhausted, resuming normal cadence"
                        );
                        cadence
                    }
                }
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(wait) => {}
        }
    }
    info!(task = name, "loop stopped");
}
