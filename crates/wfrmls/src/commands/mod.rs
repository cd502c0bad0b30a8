//! Command dispatch: resolves settings, builds the client, calls the handler.

pub mod agent;
pub mod analytics;
pub mod config_cmd;
pub mod deleted;
pub mod records;

use secrecy::SecretString;

use wfrmls_api::WfrmlsClient;
use wfrmls_config::Settings;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Settings from file and environment with `--token` / `--base-url` applied.
pub fn settings(global: &GlobalOpts) -> Result<Settings, CliError> {
    let mut settings = wfrmls_config::load(global.config.as_deref())?;
    if let Some(token) = &global.token {
        settings.bearer_token = Some(token.clone());
    }
    if let Some(url) = &global.base_url {
        settings.base_url = Some(url.clone());
    }
    Ok(settings)
}

/// API client for one-shot commands. No token is a local auth error.
pub fn build_client(settings: &Settings) -> Result<WfrmlsClient, CliError> {
    let token = settings.bearer_token.clone().map(SecretString::from);
    Ok(WfrmlsClient::new(token, settings.base_url.as_deref())?)
}

/// Dispatch a command that talks to the API.
pub async fn dispatch(
    cmd: Command,
    client: &WfrmlsClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let format = global.output;
    match cmd {
        Command::List(args) => records::list(client, &args, format).await,
        Command::Get(args) => records::get(client, &args, format).await,
        Command::Metadata => records::metadata(client).await,
        Command::Deleted(args) => deleted::handle(client, args.command, format).await,
        Command::Analytics(args) => analytics::handle(client, args.command, format).await,
        // Handled before a client is built
        Command::Config(_) | Command::Agent | Command::Completions(_) => Ok(()),
    }
}
