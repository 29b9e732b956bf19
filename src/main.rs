use std::process::ExitCode;

use clap::Parser;

use radstruct_lib::cli::Cli;
use radstruct_lib::{commands, config, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    // Outputs are staged and moved into place at the end, so dropping the
    // command future on Ctrl-C leaves earlier outputs as they were.
    let result = tokio::select! {
        result = commands::dispatch(cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, partial outputs discarded");
            return ExitCode::from(130);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "{} failed", config::APP_NAME);
            ExitCode::FAILURE
        }
    }
}
