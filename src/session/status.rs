//! Session phase and shared, observable state.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::reason::SessionOutcome;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Joining,
    AwaitingAdmission,
    Rejected,
    AdmissionTimedOut,
    Active,
    Terminating,
    Done,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Joining => "joining",
            Self::AwaitingAdmission => "awaiting_admission",
            Self::Rejected => "rejected",
            Self::AdmissionTimedOut => "admission_timed_out",
            Self::Active => "active",
            Self::Terminating => "terminating",
            Self::Done => "done",
        }
    }
}

/// Current session state, readable by the control API.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub session_id: Option<Uuid>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub outcome: Option<SessionOutcome>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            session_id: None,
            started_at: None,
            outcome: None,
        }
    }
}

impl SessionState {
    /// Seconds since the session started.
    pub fn duration_seconds(&self) -> Option<u64> {
        self.started_at.map(|started| {
            let elapsed = chrono::Utc::now() - started;
            elapsed.num_seconds().max(0) as u64
        })
    }
}

/// Thread-safe handle shared between the orchestrator and API handlers.
#[derive(Clone, Default)]
pub struct SessionStatusHandle {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionStatusHandle {
    pub async fn get(&self) -> SessionState {
        self.inner.lock().await.clone()
    }

    pub async fn begin(&self, session_id: Uuid) {
        let mut state = self.inner.lock().await;
        state.phase = SessionPhase::Joining;
        state.session_id = Some(session_id);
        state.started_at = Some(chrono::Utc::now());
        state.outcome = None;
    }

    pub async fn set_phase(&self, phase: SessionPhase) {
        let mut state = self.inner.lock().await;
        state.phase = phase;
    }

    pub async fn finish(&self, outcome: SessionOutcome) {
        let mut state = self.inner.lock().await;
        state.phase = SessionPhase::Done;
        state.outcome = Some(outcome);
    }
}
