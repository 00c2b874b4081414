//! Dashboard capabilities
//!
//! The session state machine only talks to the alarm dashboard through
//! these traits. `webdriver::DashboardBrowser` is the browser-backed
//! implementation; tests use scripted fakes.

use crate::error::Result;
use crate::models::Session;
use crate::state::Credentials;
use async_trait::async_trait;

/// Live alarm feed
#[async_trait]
pub trait SignalSource: Send {
    /// Current text of every leaf block on the monitored surface, in
    /// document order
    async fn fetch_blocks(&mut self) -> Result<Vec<String>>;
}

/// UI operations the SessionController needs
///
/// Every operation waits for the affordances it touches with a bounded
/// readiness timeout and fails instead of blocking forever.
#[async_trait]
pub trait DashboardDriver: SignalSource {
    /// Open the login page, enter credentials, submit, and return the
    /// resulting session token.
    ///
    /// Fails with `Error::Auth` when the login form is missing or the
    /// dashboard does not issue a session.
    async fn login(&mut self, credentials: &Credentials) -> Result<String>;

    /// Open the alarm center, switch alarm tracking on and focus the alarm
    /// feed. Fails with `Error::Navigation`.
    async fn enable_tracking(&mut self, session: &Session) -> Result<()>;

    /// Drop the dashboard context so the next login starts clean
    async fn end_session(&mut self) -> Result<()>;
}
