//! Long-running services on top of `wfrmls-api`.
//!
//! - **[`Agent`]**: owns the client, a data processor, a monitor and a
//!   task scheduler, and drives four cancellable loops (sync, monitoring,
//!   health checks, scheduled tasks) until [`Agent::shutdown`].
//!
//! - **[`Analytics`]**: one-shot market, pricing, agent and data-quality
//!   reports computed client-side from a single page of results.
//!
//! - **[`AgentConfig`]**: validated runtime settings. Loading from files
//!   and the environment lives in `wfrmls-config`.

pub mod agent;
pub mod analytics;
pub mod config;
pub mod error;
pub mod stats;

// ── Primary re-exports ──────────────────────────────────────────────
pub use agent::monitor::{Alert, DataMonitor, HealthState, Severity, SystemStatus};
pub use agent::processor::{DataProcessor, RecordKind};
pub use agent::scheduler::{ScheduledTask, TaskScheduler, TaskStatus};
pub use agent::webhook::{Delivery, WebhookNotifier};
pub use agent::{Agent, AgentStatus, SyncReport};
pub use analytics::{Analytics, AnalyticsError};
pub use config::{AgentConfig, LogLevel, RetryDecision, RetryPolicy};
pub use error::CoreError;
