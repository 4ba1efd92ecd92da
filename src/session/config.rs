//! Immutable per-session parameters.

use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::platform::PlatformId;

/// Thresholds that make the bot leave on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutomaticLeave {
    /// Upper bound for waiting in the lobby.
    pub waiting_room_timeout: Duration,
    /// How long to stay after admission if nobody else ever shows up.
    pub no_one_joined_timeout: Duration,
    /// How long to stay once everyone else has left.
    pub everyone_left_timeout: Duration,
}

impl Default for AutomaticLeave {
    fn default() -> Self {
        Self {
            waiting_room_timeout: Duration::from_millis(300_000),
            no_one_joined_timeout: Duration::from_millis(120_000),
            everyone_left_timeout: Duration::from_millis(60_000),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionConfig {
    pub session_id: Uuid,
    pub platform: PlatformId,
    /// Empty when none was configured; the orchestrator refuses to start then.
    pub meeting_url: String,
    pub bot_name: String,
    /// Identifier the bot manager knows this session by.
    pub connection_id: Option<String>,
    pub automatic_leave: AutomaticLeave,
}

impl SessionConfig {
    pub fn new(platform: PlatformId, meeting_url: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            platform,
            meeting_url: meeting_url.into(),
            bot_name: "Meeting Bot".to_string(),
            connection_id: None,
            automatic_leave: AutomaticLeave::default(),
        }
    }

    pub fn with_bot_name(mut self, bot_name: impl Into<String>) -> Self {
        self.bot_name = bot_name.into();
        self
    }

    pub fn with_connection_id(mut self, connection_id: Option<String>) -> Self {
        self.connection_id = connection_id;
        self
    }

    pub fn with_automatic_leave(mut self, automatic_leave: AutomaticLeave) -> Self {
        self.automatic_leave = automatic_leave;
        self
    }

    pub fn has_meeting_url(&self) -> bool {
        !self.meeting_url.trim().is_empty()
    }

    pub fn waiting_room_timeout(&self) -> Duration {
        self.automatic_leave.waiting_room_timeout
    }
}
