//! AlarmPoller - Alarm feed scanning
//!
//! ## Responsibilities
//!
//! - Read the alarm feed at a fixed pace
//! - Keep only 4-line alarm records, deduplicated per generation
//! - Resolve camera names and hand new alarms to the NotificationSink
//! - Send a keepalive every `liveness_every` iterations
//!
//! ## Exit conditions
//!
//! | Condition                         | Outcome          |
//! |-----------------------------------|------------------|
//! | Ledger reached batch threshold    | `BatchComplete`  |
//! | Keepalive failed                  | `SessionExpired` |
//! | Feed could not be read            | `SessionExpired` |

mod types;

pub use types::*;

use crate::camera_directory::CameraDirectory;
use crate::dashboard::SignalSource;
use crate::dedup_ledger::DedupLedger;
use crate::liveness_prober::LivenessCheck;
use crate::models::Session;
use crate::notification_sink::NotificationSink;
use crate::state::MonitorTiming;
use std::sync::Arc;

/// AlarmPoller instance
pub struct AlarmPoller {
    directory: Arc<CameraDirectory>,
    prober: Arc<dyn LivenessCheck>,
    sink: Arc<dyn NotificationSink>,
    timing: MonitorTiming,
}

impl AlarmPoller {
    /// Create new AlarmPoller
    pub fn new(
        directory: Arc<CameraDirectory>,
        prober: Arc<dyn LivenessCheck>,
        sink: Arc<dyn NotificationSink>,
        timing: MonitorTiming,
    ) -> Self {
        Self {
            directory,
            prober,
            sink,
            timing,
        }
    }

    /// Poll the feed until the generation has to end
    ///
    /// The iteration counter starts at 1 for every call, so the keepalive
    /// cadence restarts with each generation.
    pub async fn run(
        &self,
        session: &Session,
        source: &mut dyn SignalSource,
        ledger: &mut DedupLedger,
    ) -> PollOutcome {
        let mut iteration: u64 = 0;

        loop {
            iteration += 1;

            if self.liveness_due(iteration) && !self.prober.check(session).await {
                tracing::warn!(
                    generation = session.generation,
                    iteration = iteration,
                    alarms = ledger.len(),
                    "Session expired"
                );
                return PollOutcome::SessionExpired;
            }

            let blocks = match source.fetch_blocks().await {
                Ok(blocks) => blocks,
                Err(e) => {
                    tracing::warn!(
                        generation = session.generation,
                        iteration = iteration,
                        error = %e,
                        "Alarm feed unreadable - treating session as expired"
                    );
                    return PollOutcome::SessionExpired;
                }
            };

            let summary = self.scan(&blocks, ledger);
            if summary.emitted > 0 {
                tracing::debug!(
                    generation = session.generation,
                    iteration = iteration,
                    emitted = summary.emitted,
                    alarms = ledger.len(),
                    "Feed scanned"
                );
            }

            if summary.batch_complete {
                tracing::info!(
                    generation = session.generation,
                    iteration = iteration,
                    alarms = ledger.len(),
                    "Batch threshold reached"
                );
                return PollOutcome::BatchComplete;
            }

            tokio::time::sleep(self.timing.poll_interval).await;
        }
    }

    /// Scan one batch of feed blocks in document order
    ///
    /// Stops as soon as the ledger is full; later blocks of the batch are
    /// left for the next generation.
    pub fn scan(&self, blocks: &[String], ledger: &mut DedupLedger) -> ScanSummary {
        let mut summary = ScanSummary::default();

        for block in blocks {
            let record = match FeedRecord::parse(block) {
                Ok(record) => record,
                Err(_) => continue,
            };
            summary.records += 1;

            if ledger.contains(record.event_id) {
                summary.duplicates += 1;
                continue;
            }

            let camera_name = self.directory.resolve(record.camera_raw_id);
            let event = record.into_event(camera_name);
            if !ledger.insert(event.clone()) {
                summary.batch_complete = true;
                break;
            }
            self.sink.notify(&event);
            summary.emitted += 1;

            if ledger.is_full() {
                summary.batch_complete = true;
                break;
            }
        }

        summary.batch_complete |= ledger.is_full();
        summary
    }

    fn liveness_due(&self, iteration: u64) -> bool {
        self.timing.liveness_every > 0 && iteration % self.timing.liveness_every == 0
    }
}
