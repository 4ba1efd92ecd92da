//! Exit status, leave reasons and error detail records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use std::fmt;

use crate::platform::{PlatformError, PlatformId};

/// Binary process-level result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Why a session ended.
///
/// Platforms may hand back their own reason inside an admission decision;
/// those land in `Custom` unless they spell one of the reserved values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeaveReason {
    MissingMeetingUrl,
    JoinMeetingError,
    StopRequestedPreAdmission,
    AdmissionRejectedByAdmin,
    AdmissionTimeout,
    NormalCompletion,
    RemovedByAdmin,
    LeftAloneTimeout,
    StartupAloneTimeout,
    PostJoinSetupError,
    Custom(String),
}

impl LeaveReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::MissingMeetingUrl => "missing_meeting_url",
            Self::JoinMeetingError => "join_meeting_error",
            Self::StopRequestedPreAdmission => "stop_requested_pre_admission",
            Self::AdmissionRejectedByAdmin => "admission_rejected_by_admin",
            Self::AdmissionTimeout => "admission_timeout",
            Self::NormalCompletion => "normal_completion",
            Self::RemovedByAdmin => "removed_by_admin",
            Self::LeftAloneTimeout => "left_alone_timeout",
            Self::StartupAloneTimeout => "startup_alone_timeout",
            Self::PostJoinSetupError => "post_join_setup_error",
            Self::Custom(reason) => reason,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl From<&str> for LeaveReason {
    fn from(s: &str) -> Self {
        match s {
            "missing_meeting_url" => Self::MissingMeetingUrl,
            "join_meeting_error" => Self::JoinMeetingError,
            "stop_requested_pre_admission" => Self::StopRequestedPreAdmission,
            "admission_rejected_by_admin" => Self::AdmissionRejectedByAdmin,
            "admission_timeout" => Self::AdmissionTimeout,
            "normal_completion" => Self::NormalCompletion,
            "removed_by_admin" => Self::RemovedByAdmin,
            "left_alone_timeout" => Self::LeftAloneTimeout,
            "startup_alone_timeout" => Self::StartupAloneTimeout,
            "post_join_setup_error" => Self::PostJoinSetupError,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for LeaveReason {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<LeaveReason> for String {
    fn from(reason: LeaveReason) -> Self {
        reason.as_str().to_string()
    }
}

impl fmt::Display for LeaveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle stage an error detail was produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorContext {
    JoinMeetingError,
    PrepareSessionError,
    PostJoinSetupError,
}

impl ErrorContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JoinMeetingError => "join_meeting_error",
            Self::PrepareSessionError => "prepare_session_error",
            Self::PostJoinSetupError => "post_join_setup_error",
        }
    }
}

/// Structured record attached to abnormal terminations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    /// Source chain of the error, outermost cause first.
    pub stack: Option<String>,
    pub name: String,
    pub context: ErrorContext,
    pub platform: PlatformId,
    pub timestamp: DateTime<Utc>,
}

impl ErrorDetail {
    pub fn from_error(err: &PlatformError, context: ErrorContext, platform: PlatformId) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            message: err.to_string(),
            stack: (!causes.is_empty()).then(|| causes.join("\ncaused by: ")),
            name: err.kind().to_string(),
            context,
            platform,
            timestamp: Utc::now(),
        }
    }
}

/// Final result of a session, handed to the terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub status: ExitStatus,
    pub reason: LeaveReason,
    pub error: Option<ErrorDetail>,
}

impl SessionOutcome {
    pub fn success(reason: LeaveReason) -> Self {
        Self {
            status: ExitStatus::Success,
            reason,
            error: None,
        }
    }

    pub fn failure(reason: LeaveReason, error: Option<ErrorDetail>) -> Self {
        Self {
            status: ExitStatus::Failure,
            reason,
            error,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.status.code()
    }
}
