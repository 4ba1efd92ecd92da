use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::platform::PlatformId;

#[derive(Parser, Debug)]
#[command(name = "meeting-bot")]
#[command(about = "Attend an online meeting on someone's behalf", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run one meeting session
    Run(RunCliArgs),
    /// Print the sentinel tokens a platform driver uses to signal the bot
    Tokens(TokensCliArgs),
    /// List recorded session exits
    Sessions(SessionsCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct RunCliArgs {
    /// Config file (default: ~/.config/meeting-bot/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Meeting platform: google_meet, teams or zoom
    #[arg(long, value_parser = parse_platform)]
    pub platform: Option<PlatformId>,
    /// URL of the meeting to attend
    #[arg(long)]
    pub meeting_url: Option<String>,
    /// Display name of the bot in the meeting
    #[arg(long)]
    pub bot_name: Option<String>,
    /// Upper bound for waiting in the lobby, in milliseconds
    #[arg(long)]
    pub waiting_room_timeout_ms: Option<u64>,
    /// Session script for the scripted platform driver
    #[arg(long)]
    pub script: Option<PathBuf>,
    /// Serve the control API while the session runs
    #[arg(long)]
    pub api: bool,
}

#[derive(ClapArgs, Debug)]
pub struct TokensCliArgs {
    /// Meeting platform: google_meet, teams or zoom
    #[arg(long, value_parser = parse_platform)]
    pub platform: PlatformId,
}

#[derive(ClapArgs, Debug)]
pub struct SessionsCliArgs {
    /// Maximum number of sessions to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
    /// Only show sessions that exited with failure
    #[arg(long)]
    pub failed: bool,
}

fn parse_platform(s: &str) -> Result<PlatformId, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::try_parse_from([
            "meeting-bot",
            "run",
            "--platform",
            "zoom",
            "--meeting-url",
            "https://zoom.us/j/1",
            "--waiting-room-timeout-ms",
            "1500",
        ])
        .unwrap();

        match cli.command {
            CliCommand::Run(args) => {
                assert_eq!(args.platform, Some(PlatformId::Zoom));
                assert_eq!(args.meeting_url.as_deref(), Some("https://zoom.us/j/1"));
                assert_eq!(args.waiting_room_timeout_ms, Some(1500));
                assert!(!args.api);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        assert!(Cli::try_parse_from(["meeting-bot", "tokens", "--platform", "webex"]).is_err());
    }

    #[test]
    fn test_global_verbose_flag() {
        let cli = Cli::try_parse_from(["meeting-bot", "sessions", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
