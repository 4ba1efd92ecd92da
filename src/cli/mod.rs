pub mod args;
pub mod run;
pub mod sessions;
pub mod tokens;

pub use args::{Cli, CliCommand, RunCliArgs, SessionsCliArgs, TokensCliArgs};
pub use run::handle_run_command;
pub use sessions::handle_sessions_command;
pub use tokens::handle_tokens_command;
