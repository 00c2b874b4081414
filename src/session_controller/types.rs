//! SessionController types

use crate::alarm_poller::PollOutcome;
use serde::Serialize;

/// Session lifecycle state
///
/// ```text
/// Unauthenticated → Authenticating → Authenticated → TrackingEnabled → Polling
///        ↑                 │                 │                          │
///        └──────────── Restarting ←──────────┴──────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated,
    TrackingEnabled,
    Polling,
    Restarting,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::TrackingEnabled => "tracking_enabled",
            Self::Polling => "polling",
            Self::Restarting => "restarting",
        };
        write!(f, "{}", s)
    }
}

/// How a generation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Polling phase ran and ended normally
    Polled(PollOutcome),
    /// Login failed
    AuthFailed(String),
    /// Alarm tracking could not be enabled
    NavigationFailed(String),
}

impl GenerationOutcome {
    /// Whether the generation got as far as polling the feed
    pub fn reached_polling(&self) -> bool {
        matches!(self, Self::Polled(_))
    }
}

/// Summary of one finished generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub generation: u64,
    pub outcome: GenerationOutcome,
    /// Alarms emitted during the generation
    pub alarms: usize,
}
