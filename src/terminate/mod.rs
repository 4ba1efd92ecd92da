//! Graceful termination.
//!
//! Every session ends in exactly one [`Terminator::terminate`] call. The
//! concrete [`GracefulLeave`] leaves the meeting, reports the exit to the bot
//! manager, stores an exit record and runs the post-session hook. Each step
//! is best-effort; none of them can fail termination.

pub mod post_session_hook;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::callback::CallbackClient;
use crate::db::{self, SessionRepository};
use crate::platform::MeetingPlatform;
use crate::session::{SessionConfig, SessionOutcome};

pub use post_session_hook::{PostSessionHook, SessionExit, ShellCommandHook};

/// Single exit sink of a session.
///
/// `page` is `None` when the session never got far enough to touch the
/// meeting page.
#[async_trait]
pub trait Terminator<Page: Send + Sync>: Send + Sync {
    async fn terminate(&self, page: Option<&Page>, outcome: &SessionOutcome);
}

pub struct GracefulLeave<P: MeetingPlatform> {
    platform: Arc<P>,
    config: SessionConfig,
    callback: CallbackClient,
    db_path: Option<PathBuf>,
    hook: Option<Box<dyn PostSessionHook>>,
}

impl<P: MeetingPlatform> GracefulLeave<P> {
    pub fn new(platform: Arc<P>, config: SessionConfig, callback: CallbackClient) -> Self {
        Self {
            platform,
            config,
            callback,
            db_path: None,
            hook: None,
        }
    }

    /// Persist exit records to the SQLite database at `path`.
    pub fn with_db_path(mut self, path: PathBuf) -> Self {
        self.db_path = Some(path);
        self
    }

    pub fn with_hook(mut self, hook: Option<Box<dyn PostSessionHook>>) -> Self {
        self.hook = hook;
        self
    }

    /// Store the exit record. `None` when no database is configured.
    fn record_exit(&self, outcome: &SessionOutcome) -> anyhow::Result<Option<i64>> {
        let Some(path) = &self.db_path else {
            return Ok(None);
        };
        let conn = db::open(path)?;
        SessionRepository::insert(&conn, &self.config, outcome).map(Some)
    }
}

#[async_trait]
impl<P: MeetingPlatform> Terminator<P::Page> for GracefulLeave<P> {
    async fn terminate(&self, page: Option<&P::Page>, outcome: &SessionOutcome) {
        info!(
            "Terminating session {} with exit code {} ({})",
            self.config.session_id,
            outcome.exit_code(),
            outcome.reason
        );

        if let Some(page) = page {
            if !self
                .platform
                .leave(page, Some(&self.config), Some(&outcome.reason))
                .await
            {
                warn!("Platform leave action did not complete cleanly");
            }
        }

        if let Err(e) = self.callback.report_exit(&self.config, outcome).await {
            warn!("Failed to report exit to bot manager: {:#}", e);
        }

        match self.record_exit(outcome) {
            Ok(Some(id)) => info!("Stored exit record #{}", id),
            Ok(None) => debug!("No session database configured, exit not recorded"),
            Err(e) => error!("Failed to store exit record: {:#}", e),
        }

        if let Some(hook) = &self.hook {
            let exit = SessionExit::new(&self.config, outcome);
            if let Err(e) = hook.execute(&exit).await {
                warn!("Post-session hook failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{PlatformId, ScriptedPage, ScriptedPlatform, SessionScript};
    use crate::session::{ErrorContext, ErrorDetail, LeaveReason};

    fn config() -> SessionConfig {
        SessionConfig::new(PlatformId::Teams, "https://teams.microsoft.com/l/meetup-join/1")
    }

    #[tokio::test]
    async fn test_terminate_records_exit() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("sessions.db");
        let platform = Arc::new(ScriptedPlatform::new(PlatformId::Teams, SessionScript::default()));
        let config = config();

        let terminator = GracefulLeave::new(platform.clone(), config.clone(), CallbackClient::disabled())
            .with_db_path(db_path.clone());

        let err = crate::platform::PlatformError::failed("Error", "video element missing");
        let outcome = SessionOutcome::failure(
            LeaveReason::PostJoinSetupError,
            Some(ErrorDetail::from_error(
                &err,
                ErrorContext::PostJoinSetupError,
                PlatformId::Teams,
            )),
        );
        terminator.terminate(Some(&ScriptedPage), &outcome).await;

        assert_eq!(platform.leave_count(), 1);

        let conn = db::open(&db_path).unwrap();
        let records = SessionRepository::list(&conn, 10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].session_id, config.session_id.to_string());
        assert_eq!(records[0].reason, "post_join_setup_error");
        assert_eq!(records[0].exit_code, 1);
        assert_eq!(records[0].error_context.as_deref(), Some("post_join_setup_error"));
        assert_eq!(records[0].error_message.as_deref(), Some("video element missing"));
    }

    #[tokio::test]
    async fn test_terminate_without_page_skips_leave() {
        let platform = Arc::new(ScriptedPlatform::new(PlatformId::Zoom, SessionScript::default()));
        let terminator = GracefulLeave::new(
            platform.clone(),
            SessionConfig::new(PlatformId::Zoom, ""),
            CallbackClient::disabled(),
        );

        terminator
            .terminate(
                None,
                &SessionOutcome::failure(LeaveReason::MissingMeetingUrl, None),
            )
            .await;

        assert_eq!(platform.leave_count(), 0);
    }

    #[tokio::test]
    async fn test_terminate_survives_unwritable_db() {
        let dir = tempfile::tempdir().unwrap();
        let platform = Arc::new(ScriptedPlatform::new(PlatformId::Zoom, SessionScript::default()));
        // A directory cannot be opened as a database file.
        let terminator = GracefulLeave::new(platform, config(), CallbackClient::disabled())
            .with_db_path(dir.path().to_path_buf());

        terminator
            .terminate(
                Some(&ScriptedPage),
                &SessionOutcome::success(LeaveReason::NormalCompletion),
            )
            .await;
    }

    #[test]
    fn test_record_exit_distinguishes_missing_db_from_row_id() {
        let platform = Arc::new(ScriptedPlatform::new(PlatformId::Teams, SessionScript::default()));
        let outcome = SessionOutcome::success(LeaveReason::NormalCompletion);

        let without_db = GracefulLeave::new(platform.clone(), config(), CallbackClient::disabled());
        assert_eq!(without_db.record_exit(&outcome).unwrap(), None);

        let dir = tempfile::tempdir().unwrap();
        let with_db = GracefulLeave::new(platform, config(), CallbackClient::disabled())
            .with_db_path(dir.path().join("sessions.db"));
        assert_eq!(with_db.record_exit(&outcome).unwrap(), Some(1));
        assert_eq!(with_db.record_exit(&outcome).unwrap(), Some(2));
    }
}
