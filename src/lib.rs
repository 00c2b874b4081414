//! Alarm Center Relay Library
//!
//! Watches the vendor alarm-center dashboard (which has no API) and forwards
//! every new alarm record to a notification sink.
//!
//! ## Architecture
//!
//! 1. CameraDirectory - Raw camera id → friendly name
//! 2. LivenessProber - `global.keepAlive` session probe
//! 3. DedupLedger - Alarm ids seen in the current generation
//! 4. AlarmPoller - Feed scanning, dedup, emission
//! 5. SessionController - Login / tracking / polling / restart loop
//! 6. NotificationSink - Downstream hand-off
//! 7. WebDriver adapter - Browser implementation of the dashboard traits
//!
//! ## Generations
//!
//! A generation is one login plus one ledger. It ends when 50 distinct
//! alarms were collected or the session died; the controller then logs in
//! again with an empty ledger. The process never stops on its own.

pub mod alarm_poller;
pub mod camera_directory;
pub mod dashboard;
pub mod dedup_ledger;
pub mod liveness_prober;
pub mod notification_sink;
pub mod session_controller;
pub mod webdriver;
pub mod models;
pub mod error;
pub mod state;

pub use error::{Error, Result};
pub use state::AppConfig;
