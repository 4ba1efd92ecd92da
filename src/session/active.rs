//! Active phase: recording raced against the removal monitor.

use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::platform::{MeetingPlatform, PlatformError, RemovalNotifier, SessionSignal};

use super::config::SessionConfig;

/// How the active phase ended.
#[derive(Debug)]
pub enum ActiveOutcome {
    /// Recording ended on its own.
    Completed,
    /// Removal, or one of the alone thresholds.
    Signalled(SessionSignal),
    /// Anything else; reported as a post-join error.
    Failed(PlatformError),
}

/// Record until the meeting ends, the bot is removed, or recording fails.
///
/// The first side to settle decides. Afterwards the recording's
/// cancellation token is cancelled and the monitor is stopped, whichever
/// side won. `stop` is the session stop signal; recording gets a child of
/// it so a stop request asks recording to wind down.
pub async fn run_active_race<P>(
    platform: &P,
    page: &Arc<P::Page>,
    config: &SessionConfig,
    stop: &CancellationToken,
) -> ActiveOutcome
where
    P: MeetingPlatform + ?Sized,
{
    let (removal_tx, removal_rx) = oneshot::channel();
    let monitor = platform.start_removal_monitor(Arc::clone(page), RemovalNotifier::new(removal_tx));
    let recording_cancel = stop.child_token();

    info!("Recording started, removal monitor running");

    let outcome = tokio::select! {
        biased;

        _ = removal_detected(removal_rx) => {
            info!("Removal detected while recording");
            ActiveOutcome::Signalled(SessionSignal::RemovedByAdmin)
        }
        result = platform.start_recording(page.as_ref(), config, recording_cancel.clone()) => {
            match result {
                Ok(()) => ActiveOutcome::Completed,
                Err(PlatformError::Signal(signal)) => {
                    info!("Recording ended by signal: {}", signal);
                    ActiveOutcome::Signalled(signal)
                }
                Err(err) => {
                    warn!("Recording failed: {}", err);
                    ActiveOutcome::Failed(err)
                }
            }
        }
    };

    recording_cancel.cancel();
    monitor.stop();
    debug!("Removal monitor stopped");

    outcome
}

/// Resolves only when the monitor reports removal. A monitor that goes
/// away without reporting never resolves.
async fn removal_detected(rx: oneshot::Receiver<()>) {
    if rx.await.is_err() {
        debug!("Removal monitor dropped its notifier without reporting");
        std::future::pending::<()>().await;
    }
}
