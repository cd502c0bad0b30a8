// Periodic maintenance tasks run by the agent's scheduler loop.
//
// The scheduler never sleeps itself: the agent calls `run_pending(now)` on
// a fixed cadence and every task whose `next_run` has passed runs once.
// Missed runs are not caught up.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::processor::write_json;
use crate::config::AgentConfig;
use crate::error::CoreError;

pub const CLEANUP_LOGS: &str = "cleanup_logs";
pub const DAILY_REPORT: &str = "daily_report";
pub const CLEANUP_METRICS: &str = "cleanup_metrics";

const DAY: Duration = Duration::from_secs(24 * 60 * 60);
const LOG_RETENTION_DAYS: i64 = 7;
const METRICS_RETENTION_DAYS: i64 = 30;

/// Inputs handed to a task action on each run.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub now: DateTime<Utc>,
    pub log_dir: PathBuf,
    pub data_dir: PathBuf,
    /// Sum of `execution_count` over all tasks before this run.
    pub tasks_executed: u64,
    /// Sum of `error_count` over all tasks before this run.
    pub total_errors: u64,
}

pub type TaskAction =
    Arc<dyn Fn(TaskContext) -> BoxFuture<'static, Result<(), CoreError>> + Send + Sync>;

/// Wrap an async fn as a [`TaskAction`].
pub fn action<F, Fut>(f: F) -> TaskAction
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CoreError>> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

fn after(at: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    let delta = TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX);
    at.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// ── ScheduledTask ────────────────────────────────────────────────────

pub struct ScheduledTask {
    pub name: String,
    pub interval: Duration,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: DateTime<Utc>,
    pub enabled: bool,
    pub execution_count: u64,
    pub error_count: u64,
    action: TaskAction,
}

impl ScheduledTask {
    /// First run is due one `interval` after `created_at`.
    pub fn new(
        name: impl Into<String>,
        interval: Duration,
        action: TaskAction,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            interval,
            last_run: None,
            next_run: after(created_at, interval),
            enabled: true,
            execution_count: 0,
            error_count: 0,
            action,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && now >= self.next_run
    }

    pub fn mark_executed(&mut self, now: DateTime<Utc>) {
        self.last_run = Some(now);
        self.next_run = after(now, self.interval);
        self.execution_count += 1;
    }

    /// A failed run still moves `next_run` forward.
    pub fn mark_error(&mut self, now: DateTime<Utc>) {
        self.last_run = Some(now);
        self.next_run = after(now, self.interval);
        self.error_count += 1;
    }

    pub fn status(&self, now: DateTime<Utc>) -> TaskStatus {
        TaskStatus {
            name: self.name.clone(),
            enabled: self.enabled,
            interval_secs: self.interval.as_secs(),
            last_run: self.last_run,
            next_run: self.next_run,
            execution_count: self.execution_count,
            error_count: self.error_count,
            is_due: self.is_due(now),
        }
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("next_run", &self.next_run)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStatus {
    pub name: String,
    pub enabled: bool,
    pub interval_secs: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: DateTime<Utc>,
    pub execution_count: u64,
    pub error_count: u64,
    pub is_due: bool,
}

// ── TaskScheduler ────────────────────────────────────────────────────

#[derive(Debug)]
pub struct TaskScheduler {
    tasks: Vec<ScheduledTask>,
    log_dir: PathBuf,
    data_dir: PathBuf,
}

impl TaskScheduler {
    /// Empty registry.
    pub fn new(log_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            tasks: Vec::new(),
            log_dir: log_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Registry preloaded with the maintenance tasks.
    pub fn with_default_tasks(config: &AgentConfig, now: DateTime<Utc>) -> Self {
        let mut scheduler = Self::new(&config.log_dir, &config.data_dir);
        scheduler.add_task(CLEANUP_LOGS, DAY, action(cleanup_logs), now);
        scheduler.add_task(DAILY_REPORT, DAY, action(daily_report), now);
        scheduler.add_task(
            CLEANUP_METRICS,
            Duration::from_secs(6 * 60 * 60),
            action(cleanup_metrics),
            now,
        );
        scheduler
    }

    pub fn add_task(
        &mut self,
        name: &str,
        interval: Duration,
        action: TaskAction,
        now: DateTime<Utc>,
    ) {
        self.tasks.push(ScheduledTask::new(name, interval, action, now));
        info!(task = name, interval_secs = interval.as_secs(), "scheduled task added");
    }

    pub fn remove_task(&mut self, name: &str) -> bool {
        let Some(pos) = self.position(name) else {
            return false;
        };
        self.tasks.remove(pos);
        info!(task = name, "scheduled task removed");
        true
    }

    pub fn enable_task(&mut self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    pub fn disable_task(&mut self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.tasks.iter_mut().find(|t| t.name == name) {
            Some(task) => {
                task.enabled = enabled;
                info!(task = name, enabled, "scheduled task toggled");
                true
            }
            None => false,
        }
    }

    pub fn task(&self, name: &str) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn task_status(&self, now: DateTime<Utc>) -> Vec<TaskStatus> {
        self.tasks.iter().map(|t| t.status(now)).collect()
    }

    /// Run every due task once. Returns how many ran.
    pub async fn run_pending(&mut self, now: DateTime<Utc>) -> usize {
        let due: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_due(now))
            .map(|(i, _)| i)
            .collect();
        for &idx in &due {
            self.execute(idx, now).await;
        }
        due.len()
    }

    /// Run `name` immediately regardless of its schedule.
    pub async fn run_task_now(&mut self, name: &str, now: DateTime<Utc>) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.execute(idx, now).await;
                true
            }
            None => false,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.name == name)
    }

    fn context(&self, now: DateTime<Utc>) -> TaskContext {
        TaskContext {
            now,
            log_dir: self.log_dir.clone(),
            data_dir: self.data_dir.clone(),
            tasks_executed: self.tasks.iter().map(|t| t.execution_count).sum(),
            total_errors: self.tasks.iter().map(|t| t.error_count).sum(),
        }
    }

    async fn execute(&mut self, idx: usize, now: DateTime<Utc>) {
        let ctx = self.context(now);
        let Some(task) = self.tasks.get_mut(idx) else {
            return;
        };
        debug!(task = %task.name, "running scheduled task");
        match (task.action)(ctx).await {
            Ok(()) => {
                task.mark_executed(now);
                info!(task = %task.name, "scheduled task completed");
            }
            Err(e) => {
                task.mark_error(now);
                error!(task = %task.name, error = %e, "scheduled task failed");
            }
        }
    }
}

// ── Default task actions ─────────────────────────────────────────────

async fn cleanup_logs(ctx: TaskContext) -> Result<(), CoreError> {
    let cutoff = ctx.now - TimeDelta::days(LOG_RETENTION_DAYS);
    let removed = remove_older_than(&ctx.log_dir, cutoff, |name| name.contains(".log")).await?;
    if removed > 0 {
        info!(removed, "cleaned up old log files");
    }
    Ok(())
}

async fn cleanup_metrics(ctx: TaskContext) -> Result<(), CoreError> {
    let cutoff = ctx.now - TimeDelta::days(METRICS_RETENTION_DAYS);
    let removed = remove_older_than(&ctx.data_dir, cutoff, is_metrics_file).await?;
    if removed > 0 {
        info!(removed, "cleaned up old metrics files");
    }
    Ok(())
}

async fn daily_report(ctx: TaskContext) -> Result<(), CoreError> {
    let report = json!({
        "timestamp": ctx.now,
        "type": "daily_report",
        "tasks_executed": ctx.tasks_executed,
        "total_errors": ctx.total_errors,
        "status": "operational",
    });
    let name = format!("daily_report_{}.json", ctx.now.format("%Y%m%d"));
    write_json(&ctx.data_dir, &name, &report).await?;
    info!(report = %name, "daily report generated");
    Ok(())
}

/// `*_metrics_*.json`
fn is_metrics_file(name: &str) -> bool {
    name.strip_suffix(".json")
        .and_then(|stem| stem.split_once("_metrics_"))
        .is_some()
}

/// Delete regular files in `dir` whose name matches and whose mtime is
/// before `cutoff`. A missing directory is not an error.
async fn remove_older_than(
    dir: &Path,
    cutoff: DateTime<Utc>,
    matches: impl Fn(&str) -> bool,
) -> Result<usize, CoreError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(CoreError::io(dir, e)),
    };

    let mut removed = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CoreError::io(dir, e))?
    {
        let path = entry.path();
        let name = entry.file_name();
        if !matches(&name.to_string_lossy()) {
            continue;
        }
        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat file");
                continue;
            }
        };
        if modified < cutoff {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "cannot remove file"),
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn noop() -> TaskAction {
        action(|_| async { Ok(()) })
    }

    #[test]
    fn task_is_due_exactly_one_interval_after_creation() {
        let mut task = ScheduledTask::new("t", Duration::from_secs(10), noop(), t0());

        assert!(!task.is_due(t0() + TimeDelta::seconds(9)));
        assert!(task.is_due(t0() + TimeDelta::seconds(10)));

        let exec = t0() + TimeDelta::seconds(13);
        task.mark_executed(exec);
        assert_eq!(task.last_run, Some(exec));
        assert_eq!(task.next_run, exec + TimeDelta::seconds(10));
        assert_eq!(task.execution_count, 1);
    }

    #[test]
    fn disabled_task_is_never_due() {
        let mut task = ScheduledTask::new("t", Duration::from_secs(1), noop(), t0());
        task.enabled = false;
        assert!(!task.is_due(t0() + TimeDelta::days(1)));
    }

    #[tokio::test]
    async fn run_pending_runs_each_due_task_once() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let mut scheduler = TaskScheduler::new("logs", "data");
        scheduler.add_task(
            "count",
            Duration::from_secs(60),
            action(move |_| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
            t0(),
        );
        scheduler.add_task("later", Duration::from_secs(3600), noop(), t0());

        // Far past several intervals: still one run, no catch-up.
        let now = t0() + TimeDelta::minutes(10);
        assert_eq!(scheduler.run_pending(now).await, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.task("count").unwrap().next_run, now + TimeDelta::minutes(1));
        assert_eq!(scheduler.run_pending(now).await, 0);
    }

    #[tokio::test]
    async fn failing_task_counts_error_and_reschedules() {
        let mut scheduler = TaskScheduler::new("logs", "data");
        scheduler.add_task(
            "boom",
            Duration::from_secs(60),
            action(|_| async {
                Err(CoreError::Task {
                    name: "boom".into(),
                    reason: "nope".into(),
                })
            }),
            t0(),
        );

        let now = t0() + TimeDelta::minutes(1);
        scheduler.run_pending(now).await;
        let task = scheduler.task("boom").unwrap();
        assert_eq!(task.error_count, 1);
        assert_eq!(task.execution_count, 0);
        assert_eq!(task.next_run, now + TimeDelta::minutes(1));
    }

    #[tokio::test]
    async fn registry_operations() {
        let mut scheduler = TaskScheduler::new("logs", "data");
        scheduler.add_task("a", Duration::from_secs(60), noop(), t0());

        assert!(scheduler.disable_task("a"));
        assert!(!scheduler.task("a").unwrap().enabled);
        assert!(scheduler.enable_task("a"));
        assert!(!scheduler.enable_task("missing"));

        assert!(scheduler.run_task_now("a", t0()).await);
        assert_eq!(scheduler.task("a").unwrap().execution_count, 1);
        assert!(!scheduler.run_task_now("missing", t0()).await);

        let status = scheduler.task_status(t0());
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].name, "a");

        assert!(scheduler.remove_task("a"));
        assert!(!scheduler.remove_task("a"));
        assert!(scheduler.task_status(t0()).is_empty());
    }

    #[test]
    fn default_tasks_are_registered() {
        let config = AgentConfig::new(secrecy::SecretString::from("t"));
        let scheduler = TaskScheduler::with_default_tasks(&config, t0());
        let names: Vec<_> = scheduler.task_status(t0()).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec![CLEANUP_LOGS, DAILY_REPORT, CLEANUP_METRICS]);
        assert_eq!(
            scheduler.task(CLEANUP_METRICS).unwrap().interval,
            Duration::from_secs(21_600)
        );
    }

    #[test]
    fn metrics_file_pattern() {
        assert!(is_metrics_file("api_metrics_20240101.json"));
        assert!(!is_metrics_file("api_metrics.json"));
        assert!(!is_metrics_file("daily_report_20240101.json"));
    }

    #[tokio::test]
    async fn cleanup_removes_only_old_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("agent.log"), "x").unwrap();
        std::fs::write(dir.path().join("agent.log.2024-01-01"), "x").unwrap();
        std::fs::write(dir.path().join("keep.txt"), "x").unwrap();

        let ctx = TaskContext {
            now: Utc::now() + TimeDelta::days(8),
            log_dir: dir.path().to_path_buf(),
            data_dir: dir.path().to_path_buf(),
            tasks_executed: 0,
            total_errors: 0,
        };
        cleanup_logs(ctx.clone()).await.unwrap();
        assert!(!dir.path().join("agent.log").exists());
        assert!(!dir.path().join("agent.log.2024-01-01").exists());
        assert!(dir.path().join("keep.txt").exists());

        // Fresh files survive.
        std::fs::write(dir.path().join("agent.log"), "x").unwrap();
        let fresh = TaskContext { now: Utc::now(), ..ctx };
        cleanup_logs(fresh).await.unwrap();
        assert!(dir.path().join("agent.log").exists());
    }

    #[tokio::test]
    async fn daily_report_is_written_to_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = TaskContext {
            now: t0(),
            log_dir: dir.path().join("logs"),
            data_dir: dir.path().join("data"),
            tasks_executed: 4,
            total_errors: 1,
        };
        daily_report(ctx).await.unwrap();

        let body =
            std::fs::read_to_string(dir.path().join("data/daily_report_20240501.json")).unwrap();
        let report: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(report["tasks_executed"], 4);
        assert_eq!(report["total_errors"], 1);
        assert_eq!(report["status"], "operational");
    }

    #[tokio::test]
    async fn missing_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let removed = remove_older_than(&dir.path().join("nope"), t0(), |_| true)
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }
}
