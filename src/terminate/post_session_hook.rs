//! Post-session hook abstraction and shell command implementation.
//!
//! After a session terminates, an optional hook can run to act on the
//! result (e.g., upload the recording, page someone on failure, etc.).

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::platform::PlatformId;
use crate::session::{SessionConfig, SessionOutcome};

/// Environment variable names for session metadata passed to hooks.
pub mod hook_env {
    pub const SESSION_ID: &str = "MEETING_BOT_SESSION_ID";
    pub const PLATFORM: &str = "MEETING_BOT_PLATFORM";
    pub const MEETING_URL: &str = "MEETING_BOT_MEETING_URL";
    pub const EXIT_CODE: &str = "MEETING_BOT_EXIT_CODE";
    pub const REASON: &str = "MEETING_BOT_REASON";
}

/// Summary of a finished session, passed to hooks.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionExit {
    pub session_id: Uuid,
    pub platform: PlatformId,
    pub meeting_url: String,
    pub outcome: SessionOutcome,
}

impl SessionExit {
    pub fn new(config: &SessionConfig, outcome: &SessionOutcome) -> Self {
        Self {
            session_id: config.session_id,
            platform: config.platform,
            meeting_url: config.meeting_url.clone(),
            outcome: outcome.clone(),
        }
    }
}

#[async_trait]
pub trait PostSessionHook: Send + Sync {
    async fn execute(&self, exit: &SessionExit) -> Result<()>;
}

/// Executes a shell command with session data.
/// - Pipes the session exit as JSON to stdin
/// - Sets environment variables for session metadata
/// - Kills process on timeout
/// - Non-zero exit code logs warning but does not fail
pub struct ShellCommandHook {
    command: String,
    timeout: Duration,
}

impl ShellCommandHook {
    pub fn new(command: String, timeout_seconds: u64) -> Self {
        Self {
            command,
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    /// `None` for an empty command.
    pub fn from_command(command: &str, timeout_seconds: u64) -> Option<Self> {
        let command = command.trim();
        (!command.is_empty()).then(|| Self::new(command.to_string(), timeout_seconds))
    }
}

#[async_trait]
impl PostSessionHook for ShellCommandHook {
    async fn execute(&self, exit: &SessionExit) -> Result<()> {
        info!(
            "Running post-session hook for session {}: {}",
            exit.session_id, self.command
        );

        let payload = serde_json::to_vec(exit)?;

        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env(hook_env::SESSION_ID, exit.session_id.to_string())
            .env(hook_env::PLATFORM, exit.platform.as_str())
            .env(hook_env::MEETING_URL, &exit.meeting_url)
            .env(hook_env::EXIT_CODE, exit.outcome.exit_code().to_string())
            .env(hook_env::REASON, exit.outcome.reason.as_str())
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            use tokio::io::AsyncWriteExt;
            let _ = stdin.write_all(&payload).await;
        }

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if output.status.success() {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if !stdout.is_empty() {
                        info!("Post-session hook stdout: {}", stdout.trim());
                    }
                    info!("Post-session hook completed successfully");
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    warn!(
                        "Post-session hook exited with status {}: {}",
                        output.status,
                        stderr.trim()
                    );
                }
            }
            Ok(Err(e)) => {
                warn!("Post-session hook failed to execute: {}", e);
            }
            Err(_) => {
                warn!(
                    "Post-session hook timed out after {}s (process will be killed)",
                    self.timeout.as_secs()
                );
            }
        }

        Ok(())
    }
}
