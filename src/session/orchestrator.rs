//! Session lifecycle orchestrator.
//!
//! Drives one session through its stages:
//! join → stop check → admission ‖ prepare → recording ‖ removal → terminate
//!
//! The startup notice is spawned when the active phase begins and never
//! holds it up.
//!
//! All collaborators are injected via constructor. The orchestrator is
//! single-use: [`SessionOrchestrator::run`] consumes it and calls the
//! terminator exactly once, whichever way the session ends.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::callback::StartupNotifier;
use crate::platform::{MeetingPlatform, PlatformError};
use crate::terminate::Terminator;

use super::active::{run_active_race, ActiveOutcome};
use super::admission::{run_admission_race, AdmissionOutcome};
use super::config::SessionConfig;
use super::reason::{ErrorContext, ErrorDetail, LeaveReason, SessionOutcome};
use super::status::{SessionPhase, SessionStatusHandle};
use super::tokens::ReasonTokens;

pub struct SessionOrchestrator<P: MeetingPlatform> {
    platform: Arc<P>,
    page: Arc<P::Page>,
    config: SessionConfig,
    terminator: Box<dyn Terminator<P::Page>>,
    startup: Arc<dyn StartupNotifier>,
    status: SessionStatusHandle,
    tokens: ReasonTokens,
}

impl<P: MeetingPlatform> SessionOrchestrator<P> {
    pub fn new(
        platform: Arc<P>,
        page: Arc<P::Page>,
        config: SessionConfig,
        terminator: Box<dyn Terminator<P::Page>>,
        startup: Arc<dyn StartupNotifier>,
        status: SessionStatusHandle,
    ) -> Self {
        let tokens = ReasonTokens::for_platform(platform.id().as_str());
        Self {
            platform,
            page,
            config,
            terminator,
            startup,
            status,
            tokens,
        }
    }

    /// Run the session to completion and return how it ended.
    ///
    /// `stop` is checked once before the admission wait; after that it only
    /// asks a running recording to wind down.
    pub async fn run(self, stop: CancellationToken) -> SessionOutcome {
        if !self.config.has_meeting_url() {
            error!(
                "Session {} has no meeting URL, aborting before join",
                self.config.session_id
            );
            let outcome = SessionOutcome::failure(LeaveReason::MissingMeetingUrl, None);
            return self.terminate(None, outcome).await;
        }

        self.status.begin(self.config.session_id).await;
        info!(
            "Session {} starting on {} for {}",
            self.config.session_id, self.config.platform, self.config.meeting_url
        );

        let outcome = self.attend(&stop).await;
        self.terminate(Some(self.page.as_ref()), outcome).await
    }

    async fn attend(&self, stop: &CancellationToken) -> SessionOutcome {
        let platform = self.platform.as_ref();
        let page = self.page.as_ref();

        if let Err(err) = platform.join(page, &self.config).await {
            error!("Failed to join meeting: {}", err);
            let detail = self.error_detail(&err, ErrorContext::JoinMeetingError);
            return SessionOutcome::failure(LeaveReason::JoinMeetingError, Some(detail));
        }
        info!("Join request sent");

        if stop.is_cancelled() {
            info!("Stop requested before admission, leaving without waiting");
            return SessionOutcome::success(LeaveReason::StopRequestedPreAdmission);
        }

        self.status.set_phase(SessionPhase::AwaitingAdmission).await;
        let admission = match run_admission_race(platform, page, &self.config).await {
            Ok(admission) => admission,
            Err(err) => {
                error!("Session preparation failed: {}", err);
                let detail = self.error_detail(&err, ErrorContext::PrepareSessionError);
                return SessionOutcome::failure(LeaveReason::JoinMeetingError, Some(detail));
            }
        };

        match admission {
            AdmissionOutcome::Admitted => {}
            AdmissionOutcome::Rejected(reason) => {
                info!("Admission rejected: {}", reason);
                self.status.set_phase(SessionPhase::Rejected).await;
                return SessionOutcome::success(reason);
            }
            AdmissionOutcome::TimedOut(reason) => {
                info!("Not admitted: {}", reason);
                self.status.set_phase(SessionPhase::AdmissionTimedOut).await;
                best_effort("stateless leave", async {
                    if platform.leave(page, Some(&self.config), Some(&reason)).await {
                        Ok(())
                    } else {
                        Err("leave action reported failure")
                    }
                })
                .await;
                return SessionOutcome::success(reason);
            }
        }

        info!("Admitted to meeting");
        self.status.set_phase(SessionPhase::Active).await;
        self.spawn_startup_notification();

        match run_active_race(platform, &self.page, &self.config, stop).await {
            ActiveOutcome::Completed => SessionOutcome::success(LeaveReason::NormalCompletion),
            ActiveOutcome::Signalled(signal) => {
                info!(
                    "Active phase ended by {} ({})",
                    signal,
                    self.tokens.token(signal)
                );
                SessionOutcome::success(signal.leave_reason())
            }
            ActiveOutcome::Failed(err) => {
                error!("Post-join failure: {}", err);
                let detail = self.error_detail(&err, ErrorContext::PostJoinSetupError);
                SessionOutcome::failure(LeaveReason::PostJoinSetupError, Some(detail))
            }
        }
    }

    async fn terminate(&self, page: Option<&P::Page>, outcome: SessionOutcome) -> SessionOutcome {
        self.status.set_phase(SessionPhase::Terminating).await;
        self.terminator.terminate(page, &outcome).await;
        self.status.finish(outcome.clone()).await;
        info!(
            "Session {} done: {} (exit code {})",
            self.config.session_id,
            outcome.reason,
            outcome.exit_code()
        );
        outcome
    }

    /// Fire-and-forget; the active phase never waits on the bot manager.
    fn spawn_startup_notification(&self) {
        let startup = Arc::clone(&self.startup);
        let config = self.config.clone();
        tokio::spawn(async move {
            best_effort("startup notification", startup.notify_startup(&config)).await;
        });
    }

    fn error_detail(&self, err: &PlatformError, context: ErrorContext) -> ErrorDetail {
        ErrorDetail::from_error(err, context, self.config.platform)
    }
}

/// Await an operation whose result must never influence the session.
async fn best_effort<F, T, E>(action: &str, operation: F)
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match operation.await {
        Ok(_) => debug!("{} done", action),
        Err(e) => warn!("{} failed (ignored): {}", action, e),
    }
}
