//! `deleted sync | summary | monitor`.

use chrono::{TimeDelta, Utc};

use wfrmls_api::{MAX_TOP, ODataQuery, WfrmlsClient};

use crate::cli::{DeletedCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

const DEFAULT_SUMMARY_HOURS: i64 = 24;

pub async fn handle(
    client: &WfrmlsClient,
    cmd: DeletedCommand,
    format: OutputFormat,
) -> Result<(), CliError> {
    let deleted = client.deleted();
    match cmd {
        DeletedCommand::Sync { since, resources, top } => {
            let types = (!resources.is_empty()).then_some(resources.as_slice());
            let sync = deleted
                .all_deleted_for_sync(since, types, &ODataQuery::new().top(top))
                .await;
            output::emit(format, &sync)
        }
        DeletedCommand::Summary { since } => {
            let since = since
                .unwrap_or_else(|| (Utc::now() - TimeDelta::hours(DEFAULT_SUMMARY_HOURS)).into());
            let summary = deleted
                .deletion_summary(since, ODataQuery::new().top(MAX_TOP))
                .await?;
            output::emit(format, &summary)
        }
        DeletedCommand::Monitor { hours, threshold } => {
            let activity = deleted
                .monitor_deletion_activity(
                    Utc::now(),
                    hours,
                    threshold,
                    ODataQuery::new().top(MAX_TOP),
                )
                .await?;
            output::emit(format, &activity)
        }
    }
}
