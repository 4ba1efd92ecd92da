//! Platform-scoped sentinel tokens.
//!
//! Drivers that run outside this process (scripts, browser-side code) can
//! only report failures as text. They embed one of these tokens in the
//! message and [`ReasonTokens::classify`] turns it back into a typed
//! [`SessionSignal`] at the boundary. Inside the crate signals always travel
//! as [`PlatformError::Signal`](crate::platform::PlatformError::Signal).

use crate::platform::SessionSignal;

const REMOVED_SUFFIX: &str = "_BOT_REMOVED_BY_ADMIN";
const LEFT_ALONE_SUFFIX: &str = "_BOT_LEFT_ALONE_TIMEOUT";
const STARTUP_ALONE_SUFFIX: &str = "_BOT_STARTUP_ALONE_TIMEOUT";

/// Phrase a driver uses to report that the host refused admission.
pub const ADMIN_REJECTION_PHRASE: &str = "rejected by meeting admin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonTokens {
    removed: String,
    left_alone: String,
    startup_alone: String,
}

impl ReasonTokens {
    pub fn for_platform(platform: &str) -> Self {
        let prefix = platform.to_uppercase();
        Self {
            removed: format!("{prefix}{REMOVED_SUFFIX}"),
            left_alone: format!("{prefix}{LEFT_ALONE_SUFFIX}"),
            startup_alone: format!("{prefix}{STARTUP_ALONE_SUFFIX}"),
        }
    }

    pub fn removed(&self) -> &str {
        &self.removed
    }

    pub fn left_alone(&self) -> &str {
        &self.left_alone
    }

    pub fn startup_alone(&self) -> &str {
        &self.startup_alone
    }

    pub fn token(&self, signal: SessionSignal) -> &str {
        match signal {
            SessionSignal::RemovedByAdmin => &self.removed,
            SessionSignal::LeftAlone => &self.left_alone,
            SessionSignal::StartupAlone => &self.startup_alone,
        }
    }

    /// Recover a signal from a driver-reported message, if it carries one of
    /// this platform's tokens.
    pub fn classify(&self, message: &str) -> Option<SessionSignal> {
        [
            SessionSignal::RemovedByAdmin,
            SessionSignal::LeftAlone,
            SessionSignal::StartupAlone,
        ]
        .into_iter()
        .find(|signal| message.contains(self.token(*signal)))
    }
}

pub fn is_admin_rejection(message: &str) -> bool {
    message.to_lowercase().contains(ADMIN_REJECTION_PHRASE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_uppercased_and_suffixed() {
        let tokens = ReasonTokens::for_platform("google_meet");
        assert_eq!(tokens.removed(), "GOOGLE_MEET_BOT_REMOVED_BY_ADMIN");
        assert_eq!(tokens.left_alone(), "GOOGLE_MEET_BOT_LEFT_ALONE_TIMEOUT");
        assert_eq!(tokens.startup_alone(), "GOOGLE_MEET_BOT_STARTUP_ALONE_TIMEOUT");
    }

    #[test]
    fn test_tokens_are_deterministic() {
        assert_eq!(
            ReasonTokens::for_platform("teams"),
            ReasonTokens::for_platform("teams")
        );
    }

    #[test]
    fn test_classify_exact_and_embedded() {
        let tokens = ReasonTokens::for_platform("zoom");
        assert_eq!(
            tokens.classify("ZOOM_BOT_REMOVED_BY_ADMIN"),
            Some(SessionSignal::RemovedByAdmin)
        );
        assert_eq!(
            tokens.classify("Error: ZOOM_BOT_LEFT_ALONE_TIMEOUT after 60s"),
            Some(SessionSignal::LeftAlone)
        );
        assert_eq!(
            tokens.classify("ZOOM_BOT_STARTUP_ALONE_TIMEOUT"),
            Some(SessionSignal::StartupAlone)
        );
        assert_eq!(tokens.classify("selector not found"), None);
    }

    #[test]
    fn test_classify_ignores_other_platforms() {
        let tokens = ReasonTokens::for_platform("zoom");
        assert_eq!(tokens.classify("TEAMS_BOT_REMOVED_BY_ADMIN"), None);
    }

    #[test]
    fn test_admin_rejection_phrase() {
        assert!(is_admin_rejection("Bot was rejected by meeting admin"));
        assert!(is_admin_rejection("REJECTED BY MEETING ADMIN"));
        assert!(!is_admin_rejection("admission timed out"));
    }
}
