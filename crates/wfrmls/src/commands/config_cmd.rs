//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::settings;
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let rendered = settings(global)?.to_redacted_toml()?;
            output::print_output(&rendered)
        }
        ConfigCommand::Path => {
            let path = global.config.clone().unwrap_or_else(wfrmls_config::config_path);
            output::print_output(&path.display().to_string())
        }
    }
}
