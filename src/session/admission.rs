//! Admission race: lobby wait and session preparation run side by side.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::platform::{MeetingPlatform, PlatformError};

use super::config::SessionConfig;
use super::reason::LeaveReason;

/// What the platform reports about the lobby wait.
///
/// `rejected` only means something when `admitted` is false; the
/// constructors keep it that way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub admitted: bool,
    #[serde(default)]
    pub rejected: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl AdmissionDecision {
    pub fn admitted() -> Self {
        Self {
            admitted: true,
            rejected: false,
            reason: None,
        }
    }

    pub fn rejected(reason: Option<String>) -> Self {
        Self {
            admitted: false,
            rejected: true,
            reason,
        }
    }

    pub fn not_admitted(reason: Option<String>) -> Self {
        Self {
            admitted: false,
            rejected: false,
            reason,
        }
    }

    /// Fold the raw platform result into a decision.
    ///
    /// A failed wait becomes a rejection when the platform said the host
    /// refused, otherwise a timeout.
    pub fn normalize(result: Result<AdmissionDecision, PlatformError>) -> Self {
        match result {
            Ok(decision) if decision.admitted => Self::admitted(),
            Ok(decision) => decision,
            Err(PlatformError::AdmissionRejected) => Self::rejected(Some(
                LeaveReason::AdmissionRejectedByAdmin.as_str().to_string(),
            )),
            Err(err) => {
                debug!("Admission wait failed, treating as timeout: {}", err);
                Self::not_admitted(Some(LeaveReason::AdmissionTimeout.as_str().to_string()))
            }
        }
    }

    pub fn outcome(&self) -> AdmissionOutcome {
        if self.admitted {
            return AdmissionOutcome::Admitted;
        }

        let reason = self.reason.as_deref().filter(|r| !r.is_empty());
        if self.rejected {
            AdmissionOutcome::Rejected(
                reason.map_or(LeaveReason::AdmissionRejectedByAdmin, LeaveReason::from),
            )
        } else {
            AdmissionOutcome::TimedOut(reason.map_or(LeaveReason::AdmissionTimeout, LeaveReason::from))
        }
    }
}

impl From<bool> for AdmissionDecision {
    fn from(admitted: bool) -> Self {
        if admitted {
            Self::admitted()
        } else {
            Self::not_admitted(None)
        }
    }
}

/// Normalized result of the lobby wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    Admitted,
    Rejected(LeaveReason),
    TimedOut(LeaveReason),
}

/// Run the lobby wait and `prepare` together and wait for both.
///
/// The wait is bounded by the configured waiting-room timeout. A failing
/// `prepare` is returned as the error regardless of how admission went.
pub async fn run_admission_race<P>(
    platform: &P,
    page: &P::Page,
    config: &SessionConfig,
) -> Result<AdmissionOutcome, PlatformError>
where
    P: MeetingPlatform + ?Sized,
{
    let timeout = config.waiting_room_timeout();
    info!(
        "Waiting for admission (timeout {}ms) while preparing session",
        timeout.as_millis()
    );

    let wait = async {
        match tokio::time::timeout(timeout, platform.wait_for_admission(page, timeout, config)).await
        {
            Ok(result) => AdmissionDecision::normalize(result),
            Err(_) => {
                warn!("Admission wait exceeded {}ms", timeout.as_millis());
                AdmissionDecision::not_admitted(None)
            }
        }
    };

    let (decision, prepared) = tokio::join!(wait, platform.prepare(page, config));

    if let Err(err) = prepared {
        warn!("Session preparation failed: {}", err);
        return Err(err);
    }

    let outcome = decision.outcome();
    debug!("Admission decision {:?} -> {:?}", decision, outcome);
    Ok(outcome)
}
