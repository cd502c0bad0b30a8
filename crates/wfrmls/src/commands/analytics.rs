//! `analytics market | trends | agents | quality`.

use wfrmls_api::WfrmlsClient;
use wfrmls_core::Analytics;

use crate::cli::{AnalyticsCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    client: &WfrmlsClient,
    cmd: AnalyticsCommand,
    format: OutputFormat,
) -> Result<(), CliError> {
    let analytics = Analytics::new(client);
    match cmd {
        AnalyticsCommand::Market {
            city,
            days,
            property_type,
        } => {
            let report = analytics
                .market_summary(city.as_deref(), days, property_type.as_deref())
                .await?;
            output::emit(format, &report)
        }
        AnalyticsCommand::Trends {
            city,
            days,
            property_type,
            segments,
        } => {
            let report = analytics
                .price_trends(city.as_deref(), days, property_type.as_deref(), segments)
                .await?;
            output::emit(format, &report)
        }
        AnalyticsCommand::Agents { days, min_listings } => {
            let report = analytics.agent_performance(days, min_listings).await?;
            output::emit(format, &report)
        }
        AnalyticsCommand::Quality => {
            let report = analytics.data_quality().await?;
            output::emit(format, &report)
        }
    }
}
