//! Instrumented collaborators for driving the orchestrator in tests.

#![allow(dead_code)]

use async_trait::async_trait;
use meeting_bot::callback::StartupNotifier;
use meeting_bot::platform::{
    MeetingPlatform, MonitorHandle, PlatformError, PlatformId, RemovalNotifier, SessionSignal,
};
use meeting_bot::session::{
    AdmissionDecision, LeaveReason, SessionConfig, SessionOrchestrator, SessionOutcome,
    SessionStatusHandle,
};
use meeting_bot::terminate::Terminator;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct MockPage;

#[derive(Debug, Clone)]
pub enum MockError {
    Rejected,
    Signal(SessionSignal),
    Failed(&'static str),
}

impl MockError {
    fn to_error(&self) -> PlatformError {
        match self {
            Self::Rejected => PlatformError::AdmissionRejected,
            Self::Signal(signal) => PlatformError::Signal(*signal),
            Self::Failed(message) => PlatformError::failed("MockFailure", *message),
        }
    }
}

#[derive(Debug, Clone)]
pub enum MockAdmission {
    Decision(AdmissionDecision),
    Error(MockError),
    /// Never answers.
    Hang,
}

#[derive(Debug, Clone)]
pub enum MockRecording {
    Complete(Duration),
    Fail(Duration, MockError),
    /// Runs until its cancellation token fires, then returns normally.
    UntilCancelled,
}

pub struct MockPlatform {
    pub join_error: Option<MockError>,
    pub admission: MockAdmission,
    pub prepare_error: Option<MockError>,
    pub recording: MockRecording,
    pub removal_after: Option<Duration>,
    pub leave_succeeds: bool,
    pub(crate) calls: Mutex<Vec<&'static str>>,
    pub(crate) monitor_token: Mutex<Option<CancellationToken>>,
    pub(crate) recording_token: Mutex<Option<CancellationToken>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            join_error: None,
            admission: MockAdmission::Decision(AdmissionDecision::admitted()),
            prepare_error: None,
            recording: MockRecording::Complete(Duration::from_secs(60)),
            removal_after: None,
            leave_succeeds: true,
            calls: Mutex::new(Vec::new()),
            monitor_token: Mutex::new(None),
            recording_token: Mutex::new(None),
        }
    }
}

impl MockPlatform {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    pub fn monitor_stopped(&self) -> Option<bool> {
        self.monitor_token
            .lock()
            .unwrap()
            .as_ref()
            .map(|t| t.is_cancelled())
    }

    pub fn recording_cancelled(&self) -> Option<bool> {
        self.recording_token
            .lock()
            .unwrap()
            .as_ref()
            .map(|t| t.is_cancelled())
    }
}

#[async_trait]
impl MeetingPlatform for MockPlatform {
    type Page = MockPage;

    fn id(&self) -> PlatformId {
        PlatformId::GoogleMeet
    }

    async fn join(&self, _page: &MockPage, _config: &SessionConfig) -> Result<(), PlatformError> {
        self.record("join");
        tokio::time::sleep(Duration::from_millis(100)).await;
        match &self.join_error {
            Some(err) => Err(err.to_error()),
            None => Ok(()),
        }
    }

    async fn wait_for_admission(
        &self,
        _page: &MockPage,
        _timeout: Duration,
        _config: &SessionConfig,
    ) -> Result<AdmissionDecision, PlatformError> {
        self.record("wait_for_admission");
        tokio::time::sleep(Duration::from_millis(500)).await;
        match &self.admission {
            MockAdmission::Decision(decision) => Ok(decision.clone()),
            MockAdmission::Error(err) => Err(err.to_error()),
            MockAdmission::Hang => std::future::pending().await,
        }
    }

    async fn prepare(&self, _page: &MockPage, _config: &SessionConfig) -> Result<(), PlatformError> {
        self.record("prepare");
        tokio::time::sleep(Duration::from_millis(200)).await;
        match &self.prepare_error {
            Some(err) => Err(err.to_error()),
            None => Ok(()),
        }
    }

    async fn start_recording(
        &self,
        _page: &MockPage,
        _config: &SessionConfig,
        cancel: CancellationToken,
    ) -> Result<(), PlatformError> {
        self.record("start_recording");
        *self.recording_token.lock().unwrap() = Some(cancel.clone());
        match &self.recording {
            MockRecording::Complete(after) => {
                tokio::time::sleep(*after).await;
                Ok(())
            }
            MockRecording::Fail(after, err) => {
                tokio::time::sleep(*after).await;
                Err(err.to_error())
            }
            MockRecording::UntilCancelled => {
                cancel.cancelled().await;
                Ok(())
            }
        }
    }

    fn start_removal_monitor(
        &self,
        _page: Arc<MockPage>,
        on_removal: RemovalNotifier,
    ) -> MonitorHandle {
        self.record("start_removal_monitor");
        let token = CancellationToken::new();
        *self.monitor_token.lock().unwrap() = Some(token.clone());

        if let Some(after) = self.removal_after {
            let cancelled = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(after) => on_removal.notify(),
                    _ = cancelled.cancelled() => {}
                }
            });
        }

        MonitorHandle::new(token)
    }

    async fn leave(
        &self,
        _page: &MockPage,
        _config: Option<&SessionConfig>,
        _reason: Option<&LeaveReason>,
    ) -> bool {
        self.record("leave");
        self.leave_succeeds
    }
}

/// What the terminator saw when it was called.
#[derive(Debug, Clone)]
pub struct Termination {
    pub page_present: bool,
    pub outcome: SessionOutcome,
    pub monitor_stopped: Option<bool>,
}

#[derive(Clone)]
pub struct RecordingTerminator {
    platform: Arc<MockPlatform>,
    seen: Arc<Mutex<Vec<Termination>>>,
}

impl RecordingTerminator {
    pub fn new(platform: Arc<MockPlatform>) -> Self {
        Self {
            platform,
            seen: Arc::default(),
        }
    }

    pub fn terminations(&self) -> Vec<Termination> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Terminator<MockPage> for RecordingTerminator {
    async fn terminate(&self, page: Option<&MockPage>, outcome: &SessionOutcome) {
        self.seen.lock().unwrap().push(Termination {
            page_present: page.is_some(),
            outcome: outcome.clone(),
            monitor_stopped: self.platform.monitor_stopped(),
        });
    }
}

#[derive(Clone, Default)]
pub struct CountingNotifier {
    pub calls: Arc<AtomicUsize>,
    pub fail: bool,
    /// Never answers.
    pub hang: bool,
}

#[async_trait]
impl StartupNotifier for CountingNotifier {
    async fn notify_startup(&self, _config: &SessionConfig) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            anyhow::bail!("bot manager unreachable");
        }
        Ok(())
    }
}

impl CountingNotifier {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn config() -> SessionConfig {
    let mut config = SessionConfig::new(PlatformId::GoogleMeet, "https://meet.google.com/abc-defg-hij");
    config.automatic_leave.waiting_room_timeout = Duration::from_secs(30);
    config
}

/// Everything a test needs to inspect after a session.
pub struct Harness {
    pub platform: Arc<MockPlatform>,
    pub terminator: RecordingTerminator,
    pub notifier: CountingNotifier,
    pub status: SessionStatusHandle,
}

impl Harness {
    pub fn new(platform: MockPlatform) -> Self {
        let platform = Arc::new(platform);
        Self {
            terminator: RecordingTerminator::new(Arc::clone(&platform)),
            platform,
            notifier: CountingNotifier::default(),
            status: SessionStatusHandle::default(),
        }
    }

    pub fn with_failing_notifier(mut self) -> Self {
        self.notifier.fail = true;
        self
    }

    pub fn with_hanging_notifier(mut self) -> Self {
        self.notifier.hang = true;
        self
    }

    pub async fn run(&self, config: SessionConfig, stop: CancellationToken) -> SessionOutcome {
        let orchestrator = SessionOrchestrator::new(
            Arc::clone(&self.platform),
            Arc::new(MockPage),
            config,
            Box::new(self.terminator.clone()),
            Arc::new(self.notifier.clone()),
            self.status.clone(),
        );
        orchestrator.run(stop).await
    }

    /// The single termination of the session; panics if there was not
    /// exactly one.
    pub fn termination(&self) -> Termination {
        let seen = self.terminator.terminations();
        assert_eq!(seen.len(), 1, "terminator must be called exactly once");
        seen[0].clone()
    }
}
