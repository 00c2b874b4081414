//! SessionController - Dashboard session lifecycle
//!
//! ## Responsibilities
//!
//! - Log in and enable alarm tracking
//! - Hand the session to the AlarmPoller
//! - Restart with a fresh session and ledger whenever a generation ends
//!
//! ## Failure policy
//!
//! Login and navigation failures never stop the process. They end the
//! generation, the dashboard context is torn down and the next generation
//! starts after a backoff. Only configuration errors (raised before the
//! controller exists) are fatal.

mod types;

pub use types::*;

use crate::alarm_poller::{AlarmPoller, PollOutcome};
use crate::dashboard::DashboardDriver;
use crate::dedup_ledger::DedupLedger;
use crate::error::Result;
use crate::models::Session;
use crate::state::{Credentials, MonitorTiming};

/// SessionController instance
///
/// Owns the dashboard driver and the current session exclusively.
pub struct SessionController<D: DashboardDriver> {
    driver: D,
    poller: AlarmPoller,
    credentials: Credentials,
    timing: MonitorTiming,
    state: SessionState,
    generation: u64,
    consecutive_failures: u32,
}

impl<D: DashboardDriver> SessionController<D> {
    /// Create new SessionController
    pub fn new(
        driver: D,
        poller: AlarmPoller,
        credentials: Credentials,
        timing: MonitorTiming,
    ) -> Self {
        Self {
            driver,
            poller,
            credentials,
            timing,
            state: SessionState::Unauthenticated,
            generation: 0,
            consecutive_failures: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of generations started so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Run generations forever
    pub async fn run(&mut self) {
        tracing::info!("Session controller started");
        loop {
            let report = self.run_generation().await;

            if report.outcome.reached_polling() {
                self.consecutive_failures = 0;
            } else {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            }

            let delay = self.timing.restart_backoff(self.consecutive_failures);
            tracing::info!(
                generation = report.generation,
                outcome = ?report.outcome,
                alarms = report.alarms,
                consecutive_failures = self.consecutive_failures,
                delay_ms = delay.as_millis() as u64,
                "Generation finished, restarting"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One full generation: login → tracking → polling → restart
    ///
    /// Always ends back in `Unauthenticated` with the dashboard context
    /// torn down and the ledger discarded.
    pub async fn run_generation(&mut self) -> GenerationReport {
        self.generation += 1;
        let generation = self.generation;
        let mut alarms = 0;

        let outcome = match self.authenticate().await {
            Err(e) => {
                tracing::error!(generation = generation, error = %e, "Authentication failed");
                GenerationOutcome::AuthFailed(e.to_string())
            }
            Ok(session) => match self.enable_tracking(&session).await {
                Err(e) => {
                    tracing::error!(generation = generation, error = %e, "Enabling alarm tracking failed");
                    GenerationOutcome::NavigationFailed(e.to_string())
                }
                Ok(()) => {
                    let mut ledger = DedupLedger::new(self.timing.batch_threshold);
                    let outcome = self.run_polling_phase(&session, &mut ledger).await;
                    alarms = ledger.len();
                    GenerationOutcome::Polled(outcome)
                }
            },
        };

        self.restart().await;

        GenerationReport {
            generation,
            outcome,
            alarms,
        }
    }

    /// Log in with the configured credentials
    pub async fn authenticate(&mut self) -> Result<Session> {
        self.transition(SessionState::Authenticating);
        let token = self.driver.login(&self.credentials).await?;
        let session = Session::new(token, self.generation);
        self.transition(SessionState::Authenticated);
        Ok(session)
    }

    /// Switch on alarm tracking for `session`
    pub async fn enable_tracking(&mut self, session: &Session) -> Result<()> {
        self.driver.enable_tracking(session).await?;
        self.transition(SessionState::TrackingEnabled);
        Ok(())
    }

    /// Poll until the generation has to end
    pub async fn run_polling_phase(
        &mut self,
        session: &Session,
        ledger: &mut DedupLedger,
    ) -> PollOutcome {
        self.transition(SessionState::Polling);
        self.poller.run(session, &mut self.driver, ledger).await
    }

    /// Tear down the dashboard context and go back to `Unauthenticated`
    async fn restart(&mut self) {
        self.transition(SessionState::Restarting);
        if let Err(e) = self.driver.end_session().await {
            tracing::warn!(
                generation = self.generation,
                error = %e,
                "Failed to end dashboard session"
            );
        }
        self.transition(SessionState::Unauthenticated);
    }

    fn transition(&mut self, to: SessionState) {
        tracing::debug!(
            generation = self.generation,
            from = %self.state,
            to = %to,
            "Session state transition"
        );
        self.state = to;
    }
}
