//! Script-driven platform.
//!
//! Plays back a [`SessionScript`] instead of driving a real browser: every
//! step waits a configured time and then succeeds or fails with a message.
//! Failure messages go through [`ReasonTokens::classify`], so a script can
//! end recording with e.g. `ZOOM_BOT_LEFT_ALONE_TIMEOUT` exactly like a
//! browser-side driver would.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{
    MeetingPlatform, MonitorHandle, PlatformError, PlatformId, RemovalNotifier, SessionSignal,
};
use crate::session::tokens::{is_admin_rejection, ReasonTokens};
use crate::session::{AdmissionDecision, LeaveReason, SessionConfig};

/// A step that takes some time and then succeeds or fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptStep {
    pub delay_ms: u64,
    pub fail: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyResult {
    #[default]
    Admitted,
    Rejected,
    /// Never admitted; the wait runs into its timeout.
    Waiting,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionScript {
    pub delay_ms: u64,
    pub result: LobbyResult,
    pub reason: Option<String>,
    pub fail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingScript {
    /// How long the meeting lasts.
    pub duration_ms: u64,
    /// Fail with this message once the duration is over.
    pub fail: Option<String>,
    /// When false nobody else ever shows up, and recording ends after the
    /// no-one-joined threshold.
    pub participants_join: bool,
    /// Everyone else leaves this long after recording starts; recording
    /// ends once the everyone-left threshold has passed on top of it.
    pub participants_leave_after_ms: Option<u64>,
}

impl Default for RecordingScript {
    fn default() -> Self {
        Self {
            duration_ms: 5_000,
            fail: None,
            participants_join: true,
            participants_leave_after_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemovalScript {
    /// Report removal this long after the monitor starts.
    pub after_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaveScript {
    pub succeeds: bool,
}

impl Default for LeaveScript {
    fn default() -> Self {
        Self { succeeds: true }
    }
}

/// Full script of one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionScript {
    pub join: ScriptStep,
    pub admission: AdmissionScript,
    pub prepare: ScriptStep,
    pub recording: RecordingScript,
    pub removal: RemovalScript,
    pub leave: LeaveScript,
}

impl SessionScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session script {:?}", path))?;
        toml::from_str(&content).context("Failed to parse session script")
    }
}

/// Page handle of the scripted platform; there is no browser behind it.
#[derive(Debug, Default)]
pub struct ScriptedPage;

pub struct ScriptedPlatform {
    id: PlatformId,
    script: SessionScript,
    tokens: ReasonTokens,
    leave_calls: AtomicUsize,
}

impl ScriptedPlatform {
    pub fn new(id: PlatformId, script: SessionScript) -> Self {
        Self {
            id,
            script,
            tokens: ReasonTokens::for_platform(id.as_str()),
            leave_calls: AtomicUsize::new(0),
        }
    }

    pub fn leave_count(&self) -> usize {
        self.leave_calls.load(Ordering::SeqCst)
    }

    /// Turn a scripted failure message into a typed error.
    fn failure(&self, message: &str) -> PlatformError {
        if let Some(signal) = self.tokens.classify(message) {
            return PlatformError::Signal(signal);
        }
        if is_admin_rejection(message) {
            return PlatformError::AdmissionRejected;
        }
        PlatformError::failed("ScriptedFailure", message)
    }

    /// When the bot would find itself alone, and which signal that raises.
    fn alone_after(&self, config: &SessionConfig) -> Option<(Duration, SessionSignal)> {
        let script = &self.script.recording;
        let thresholds = &config.automatic_leave;
        if !script.participants_join {
            return Some((thresholds.no_one_joined_timeout, SessionSignal::StartupAlone));
        }
        script.participants_leave_after_ms.map(|after| {
            (
                Duration::from_millis(after) + thresholds.everyone_left_timeout,
                SessionSignal::LeftAlone,
            )
        })
    }

    async fn play(&self, name: &str, step: &ScriptStep) -> Result<(), PlatformError> {
        debug!("[{}] {} ({}ms)", self.id, name, step.delay_ms);
        tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;
        match &step.fail {
            Some(message) => Err(self.failure(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MeetingPlatform for ScriptedPlatform {
    type Page = ScriptedPage;

    fn id(&self) -> PlatformId {
        self.id
    }

    async fn join(&self, _page: &ScriptedPage, config: &SessionConfig) -> Result<(), PlatformError> {
        info!("[{}] Joining {} as {}", self.id, config.meeting_url, config.bot_name);
        self.play("join", &self.script.join).await
    }

    async fn wait_for_admission(
        &self,
        _page: &ScriptedPage,
        timeout: Duration,
        _config: &SessionConfig,
    ) -> Result<AdmissionDecision, PlatformError> {
        let script = &self.script.admission;
        if script.result == LobbyResult::Waiting {
            tokio::time::sleep(timeout).await;
            return Ok(AdmissionDecision::not_admitted(script.reason.clone()));
        }

        tokio::time::sleep(Duration::from_millis(script.delay_ms)).await;
        if let Some(message) = &script.fail {
            return Err(self.failure(message));
        }

        Ok(match script.result {
            LobbyResult::Admitted => AdmissionDecision::admitted(),
            _ => AdmissionDecision::rejected(script.reason.clone()),
        })
    }

    async fn prepare(&self, _page: &ScriptedPage, _config: &SessionConfig) -> Result<(), PlatformError> {
        self.play("prepare", &self.script.prepare).await
    }

    async fn start_recording(
        &self,
        _page: &ScriptedPage,
        config: &SessionConfig,
        cancel: CancellationToken,
    ) -> Result<(), PlatformError> {
        let script = &self.script.recording;
        let meeting = Duration::from_millis(script.duration_ms);
        let (wait, alone) = match self.alone_after(config) {
            Some((after, signal)) if after < meeting => (after, Some(signal)),
            _ => (meeting, None),
        };

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancel.cancelled() => {
                info!("[{}] Recording asked to stop", self.id);
                return Ok(());
            }
        }

        if let Some(signal) = alone {
            info!("[{}] Bot alone in meeting: {}", self.id, self.tokens.token(signal));
            return Err(PlatformError::Signal(signal));
        }

        match &script.fail {
            Some(message) => Err(self.failure(message)),
            None => Ok(()),
        }
    }

    fn start_removal_monitor(
        &self,
        _page: Arc<ScriptedPage>,
        on_removal: RemovalNotifier,
    ) -> MonitorHandle {
        let token = CancellationToken::new();
        let Some(after_ms) = self.script.removal.after_ms else {
            return MonitorHandle::new(token);
        };

        let cancelled = token.clone();
        let id = self.id;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(after_ms)) => {
                    info!("[{}] Scripted removal", id);
                    on_removal.notify();
                }
                _ = cancelled.cancelled() => {
                    debug!("[{}] Removal monitor stopped", id);
                }
            }
        });

        MonitorHandle::new(token)
    }

    async fn leave(
        &self,
        _page: &ScriptedPage,
        _config: Option<&SessionConfig>,
        reason: Option<&LeaveReason>,
    ) -> bool {
        self.leave_calls.fetch_add(1, Ordering::SeqCst);
        info!(
            "[{}] Leaving meeting ({})",
            self.id,
            reason.map_or("no reason", |r| r.as_str())
        );
        self.script.leave.succeeds
    }
}
