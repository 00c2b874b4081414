//! AlarmPoller types

use crate::error::{Error, Result};
use crate::models::AlarmEvent;
use serde::Serialize;

/// Number of lines in one alarm record
pub const RECORD_FIELDS: usize = 4;

/// Why a polling phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    /// Batch threshold reached
    BatchComplete,
    /// Keepalive failed or the feed vanished
    SessionExpired,
}

impl std::fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BatchComplete => write!(f, "batch_complete"),
            Self::SessionExpired => write!(f, "session_expired"),
        }
    }
}

/// Result of scanning one batch of feed blocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Blocks with the alarm record shape
    pub records: usize,
    /// New alarms handed to the sink
    pub emitted: usize,
    /// Records already in the ledger
    pub duplicates: usize,
    /// Ledger hit the batch threshold during the scan
    pub batch_complete: bool,
}

/// One alarm record as it appears in the feed (before name resolution)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRecord<'a> {
    pub event_id: &'a str,
    pub timestamp: &'a str,
    pub alarm_type: &'a str,
    pub camera_raw_id: &'a str,
}

impl<'a> FeedRecord<'a> {
    /// Parse one feed block
    ///
    /// A record is exactly four lines: id, timestamp, alarm type, camera id.
    /// `\r\n` line endings are accepted.
    pub fn parse(block: &'a str) -> Result<Self> {
        let lines: Vec<&str> = block
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();

        match lines[..] {
            [event_id, timestamp, alarm_type, camera_raw_id] => Ok(Self {
                event_id,
                timestamp,
                alarm_type,
                camera_raw_id,
            }),
            _ => Err(Error::Parse(format!(
                "expected {} lines, got {}",
                RECORD_FIELDS,
                lines.len()
            ))),
        }
    }

    /// Build the event with the resolved camera name
    pub fn into_event(self, camera_name: String) -> AlarmEvent {
        AlarmEvent {
            event_id: self.event_id.to_string(),
            timestamp: self.timestamp.to_string(),
            alarm_type: self.alarm_type.to_string(),
            camera_raw_id: self.camera_raw_id.to_string(),
            camera_name,
        }
    }
}
