//! NotificationSink - Downstream hand-off for new alarms
//!
//! The core calls `notify` once per accepted alarm and never waits for an
//! acknowledgment. Delivery to chat/messaging services happens outside this
//! crate; `ChannelSink` hands events to such a consumer.

use crate::models::AlarmEvent;
use tokio::sync::mpsc;

/// Receives alarms emitted by the AlarmPoller
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: &AlarmEvent);
}

/// Writes each alarm to stdout as JSON
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for ConsoleSink {
    fn notify(&self, event: &AlarmEvent) {
        tracing::info!(
            event_id = %event.event_id,
            camera_id = %event.camera_raw_id,
            camera_name = %event.camera_name,
            alarm_type = %event.alarm_type,
            timestamp = %event.timestamp,
            "New alarm"
        );
        match serde_json::to_string(event) {
            Ok(json) => println!("New Alarm: {}", json),
            Err(e) => tracing::error!(error = %e, "Failed to serialize alarm"),
        }
    }
}

/// Forwards alarms into an unbounded channel
///
/// Events are dropped (with a warning) once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<AlarmEvent>,
}

impl ChannelSink {
    /// Create sink and the matching receiver
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AlarmEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, event: &AlarmEvent) {
        if self.tx.send(event.clone()).is_err() {
            tracing::warn!(event_id = %event.event_id, "Alarm receiver closed, event dropped");
        }
    }
}
