//! `wfrmls agent`: run the background agent until Ctrl-C or SIGTERM.

use chrono::Utc;
use tracing::{info, warn};

use wfrmls_core::Agent;

use crate::cli::GlobalOpts;
use crate::commands::settings;
use crate::error::CliError;
use crate::logging;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = settings(global)?.to_agent_config()?;
    let _guard = logging::init_agent(&config, global.verbose)?;

    info!(
        sync_interval = config.sync_interval.as_secs(),
        monitor_interval = config.monitor_interval.as_secs(),
        health_check_interval = config.health_check_interval.as_secs(),
        data_dir = %config.data_dir.display(),
        "agent configuration loaded"
    );

    let agent = Agent::new(config)?;
    agent.start().await?;

    shutdown_signal().await;
    info!("shutdown requested");
    agent.shutdown().await;

    let status = agent.status(Utc::now()).await;
    info!(
        total_requests = status.system.total_requests,
        recent_alerts = status.system.recent_alerts,
        "final status"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
