mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // The agent sets up its own logging once its config is known
        Command::Agent => commands::agent::handle(&cli.global).await,

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "wfrmls", &mut std::io::stdout());
            Ok(())
        }

        Command::Config(args) => {
            logging::init_cli(cli.global.verbose);
            commands::config_cmd::handle(&args, &cli.global)
        }

        cmd => {
            logging::init_cli(cli.global.verbose);
            let settings = commands::settings(&cli.global)?;
            let client = commands::build_client(&settings)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &client, &cli.global).await
        }
    }
}
