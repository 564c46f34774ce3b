//! docstream - streaming AI document formatter client
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use docstream::cli::{AppContext, Cli, Commands, account, config, format};
use docstream::core::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(logging::parse_log_level_from_env)
        .unwrap_or_default();
    let log_format = if cli.json_output {
        logging::LogFormat::Json
    } else {
        logging::parse_log_format_from_env().unwrap_or_default()
    };
    let log_file = logging::parse_log_file_from_env();
    logging::init(log_level, log_format, log_file, cli.verbose);

    let format = cli.effective_format();
    let pretty = cli.pretty;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, code = e.error_code(), "Command failed");
            eprintln!("{}", docstream::render::error::render_error(&e, format, pretty));
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> docstream::Result<()> {
    let ctx = AppContext::from_cli(&cli)?;

    match &cli.command {
        Commands::Login(args) => account::login(&ctx, args).await,
        Commands::Logout => account::logout(&ctx).await,
        Commands::Whoami(args) => account::whoami(&ctx, args).await,
        Commands::Refresh => account::refresh(&ctx).await,
        Commands::Format(args) => format::execute(&ctx, args).await,
        Commands::Config(command) => config::execute(&ctx, command),
    }
}
