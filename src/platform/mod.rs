//! Meeting platform contract.
//!
//! Every supported meeting platform (Google Meet, Teams, Zoom) provides one
//! [`MeetingPlatform`] implementation. The session orchestrator only decides
//! *when* these operations run and how their results are interpreted; how a
//! platform actually detects admission or removal is its own business.

pub mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::session::{AdmissionDecision, LeaveReason, SessionConfig};

pub use scripted::{ScriptedPage, ScriptedPlatform, SessionScript};

/// Identity of a supported meeting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformId {
    GoogleMeet,
    Teams,
    Zoom,
}

impl PlatformId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleMeet => "google_meet",
            Self::Teams => "teams",
            Self::Zoom => "zoom",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google_meet" => Ok(Self::GoogleMeet),
            "teams" => Ok(Self::Teams),
            "zoom" => Ok(Self::Zoom),
            _ => anyhow::bail!(
                "Unknown meeting platform '{}'. Supported platforms: google_meet, teams, zoom",
                s
            ),
        }
    }
}

/// Signals raised during the active phase that end the session normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// An administrator removed the bot from the meeting.
    RemovedByAdmin,
    /// Everyone else left and the bot stayed alone past the threshold.
    LeftAlone,
    /// Nobody joined within the threshold after the bot was admitted.
    StartupAlone,
}

impl SessionSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RemovedByAdmin => "removed_by_admin",
            Self::LeftAlone => "left_alone_timeout",
            Self::StartupAlone => "startup_alone_timeout",
        }
    }

    pub fn leave_reason(&self) -> LeaveReason {
        match self {
            Self::RemovedByAdmin => LeaveReason::RemovedByAdmin,
            Self::LeftAlone => LeaveReason::LeftAloneTimeout,
            Self::StartupAlone => LeaveReason::StartupAloneTimeout,
        }
    }
}

impl fmt::Display for SessionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by platform operations.
///
/// Recognised conditions travel as dedicated variants, so callers never
/// need to look inside messages to find out what happened.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("rejected by meeting admin")]
    AdmissionRejected,

    #[error("session ended by signal: {0}")]
    Signal(SessionSignal),

    #[error("{message}")]
    Failed {
        kind: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl PlatformError {
    pub fn failed(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            kind: kind.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Short name of the error kind, used as `ErrorDetail::name`.
    pub fn kind(&self) -> &str {
        match self {
            Self::AdmissionRejected => "AdmissionRejected",
            Self::Signal(_) => "SessionSignal",
            Self::Failed { kind, .. } => kind,
        }
    }

    pub fn signal(&self) -> Option<SessionSignal> {
        match self {
            Self::Signal(signal) => Some(*signal),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for PlatformError {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed {
            kind: "Error".to_string(),
            message: format!("{err:#}"),
            source: Some(err.into()),
        }
    }
}

/// Handed to a removal monitor; consumed when removal is detected, so the
/// orchestrator hears about it at most once.
#[derive(Debug)]
pub struct RemovalNotifier {
    tx: oneshot::Sender<()>,
}

impl RemovalNotifier {
    pub fn new(tx: oneshot::Sender<()>) -> Self {
        Self { tx }
    }

    pub fn notify(self) {
        // The receiver is gone once the active phase has been decided.
        let _ = self.tx.send(());
    }
}

/// Stop handle for a background removal monitor.
///
/// Cancels the monitor's token on `stop` and again on drop.
#[derive(Debug)]
pub struct MonitorHandle {
    token: CancellationToken,
}

impl MonitorHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// UI-driving strategies for one meeting platform.
///
/// All operations receive the shared page handle. The removal monitor and
/// recording read it concurrently during the active phase.
#[async_trait]
pub trait MeetingPlatform: Send + Sync {
    /// Browser page (or equivalent) the strategies drive.
    type Page: Send + Sync + 'static;

    fn id(&self) -> PlatformId;

    async fn join(&self, page: &Self::Page, config: &SessionConfig) -> Result<(), PlatformError>;

    /// Wait in the lobby until admitted, rejected or `timeout` elapses.
    async fn wait_for_admission(
        &self,
        page: &Self::Page,
        timeout: Duration,
        config: &SessionConfig,
    ) -> Result<AdmissionDecision, PlatformError>;

    /// Session setup that runs alongside the admission wait.
    async fn prepare(&self, page: &Self::Page, config: &SessionConfig)
        -> Result<(), PlatformError>;

    /// Record until the meeting ends naturally or `cancel` fires.
    ///
    /// May fail with [`PlatformError::Signal`] for the left-alone and
    /// startup-alone thresholds.
    async fn start_recording(
        &self,
        page: &Self::Page,
        config: &SessionConfig,
        cancel: CancellationToken,
    ) -> Result<(), PlatformError>;

    /// Start watching for removal in the background.
    fn start_removal_monitor(
        &self,
        page: Arc<Self::Page>,
        on_removal: RemovalNotifier,
    ) -> MonitorHandle;

    /// Stateless, idempotent leave. Usable even when the session was never
    /// fully established. Returns whether the leave UI action succeeded.
    async fn leave(
        &self,
        page: &Self::Page,
        config: Option<&SessionConfig>,
        reason: Option<&LeaveReason>,
    ) -> bool;
}
