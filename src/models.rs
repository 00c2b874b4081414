//! Shared models for Alarm Center Relay
//!
//! Types passed between the poller, the ledger, the sinks and the
//! session controller live here to avoid circular dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One alarm record taken from the dashboard feed
///
/// `event_id` is only unique within one session generation; the feed
/// starts numbering again after a re-login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmEvent {
    pub event_id: String,
    pub timestamp: String,
    pub alarm_type: String,
    pub camera_raw_id: String,
    /// Friendly name from the camera directory (raw id when unmapped)
    pub camera_name: String,
}

/// Authenticated dashboard context
///
/// Owned by the SessionController for exactly one generation.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session token from the browser cookie store
    pub token: String,
    /// Generation number (1 for the first login of the process)
    pub generation: u64,
    pub established_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, generation: u64) -> Self {
        Self {
            token: token.into(),
            generation,
            established_at: Utc::now(),
        }
    }
}
