mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.command);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    if let Some(payload) = commands::run(cli).await? {
        output::render(&payload, cli.pretty)?;
    }
    Ok(())
}

/// Logs go to stderr so command output on stdout stays valid JSON. The server
/// logs at info by default, one-shot commands only warn. `RUST_LOG` wins.
fn init_tracing(command: &Command) {
    let default_filter = match command {
        Command::Serve(_) => "stockcast=info,tower_http=info",
        _ => "stockcast=warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
