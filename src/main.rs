use anyhow::Result;
use clap::Parser;
use meeting_bot::cli::{
    handle_run_command, handle_sessions_command, handle_tokens_command, Cli, CliCommand,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        CliCommand::Run(args) => {
            let outcome = handle_run_command(args).await?;
            println!("{} (exit code {})", outcome.reason, outcome.exit_code());
            Ok(ExitCode::from(outcome.exit_code() as u8))
        }
        CliCommand::Tokens(args) => {
            handle_tokens_command(args)?;
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Sessions(args) => {
            handle_sessions_command(args)?;
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Version => {
            println!("meeting-bot {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}
