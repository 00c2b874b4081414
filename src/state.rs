//! Application configuration
//!
//! Holds every tunable the relay uses. Values come from the CLI (see
//! `main.rs`); the defaults below mirror the pacing of the dashboard
//! connector this service replaces.

use std::path::PathBuf;
use std::time::Duration;

/// デフォルト設定値
pub mod defaults {
    /// Distinct alarms collected before a forced session restart
    pub const BATCH_THRESHOLD: usize = 50;
    /// Keepalive is sent every N poll iterations
    pub const LIVENESS_EVERY: u64 = 10;
    pub const POLL_INTERVAL_SECS: u64 = 3;
    pub const RESTART_DELAY_SECS: u64 = 3;
    pub const MAX_RESTART_DELAY_SECS: u64 = 60;
    pub const READY_TIMEOUT_SECS: u64 = 10;
    pub const PROBE_TIMEOUT_SECS: u64 = 5;
    pub const WEBDRIVER_URL: &str = "http://localhost:4444";
    /// The alarm center only renders for Internet Explorer
    pub const USER_AGENT: &str =
        "Mozilla/5.0 (Windows NT 10.0; WOW64; Trident/7.0; Touch; rv:11.0) like Gecko";
    /// Cookie holding the dashboard session id
    pub const SESSION_COOKIE: &str = "DhWebClientSessionID";
}

/// Dashboard login credentials
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Pacing, timeouts and thresholds for the session state machine
#[derive(Debug, Clone)]
pub struct MonitorTiming {
    /// Sleep between poll iterations
    pub poll_interval: Duration,
    /// Keepalive cadence in iterations
    pub liveness_every: u64,
    /// Ledger size that ends a generation
    pub batch_threshold: usize,
    /// Base wait between generations
    pub restart_delay: Duration,
    /// Cap for the failure backoff
    pub max_restart_delay: Duration,
    /// Upper bound when waiting for a dashboard affordance
    pub ready_timeout: Duration,
    /// Keepalive request timeout
    pub probe_timeout: Duration,
}

impl Default for MonitorTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(defaults::POLL_INTERVAL_SECS),
            liveness_every: defaults::LIVENESS_EVERY,
            batch_threshold: defaults::BATCH_THRESHOLD,
            restart_delay: Duration::from_secs(defaults::RESTART_DELAY_SECS),
            max_restart_delay: Duration::from_secs(defaults::MAX_RESTART_DELAY_SECS),
            ready_timeout: Duration::from_secs(defaults::READY_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(defaults::PROBE_TIMEOUT_SECS),
        }
    }
}

impl MonitorTiming {
    /// Wait before the next generation
    ///
    /// `consecutive_failures` counts generations that never reached polling.
    /// The delay doubles per failure and is capped at `max_restart_delay`.
    pub fn restart_backoff(&self, consecutive_failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(consecutive_failures.min(16));
        self.restart_delay
            .saturating_mul(factor)
            .min(self.max_restart_delay.max(self.restart_delay))
    }
}

/// Browser settings for the WebDriver adapter
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// WebDriver server (geckodriver / chromedriver)
    pub webdriver_url: String,
    /// User agent override sent by the browser
    pub user_agent: String,
    pub headless: bool,
    /// Cookie carrying the session token
    pub session_cookie: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: defaults::WEBDRIVER_URL.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            headless: false,
            session_cookie: defaults::SESSION_COOKIE.to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Dashboard host (`host[:port]` or full base URL)
    pub host: String,
    pub credentials: Credentials,
    /// Camera list JSON file
    pub camera_list: PathBuf,
    pub timing: MonitorTiming,
    pub browser: BrowserConfig,
}

impl AppConfig {
    /// Base URL of the dashboard
    pub fn dashboard_url(&self) -> String {
        dashboard_url(&self.host)
    }
}

/// Normalize a `--host` value into a base URL without trailing slash
pub fn dashboard_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_url_adds_scheme() {
        assert_eq!(dashboard_url("192.168.1.10"), "http://192.168.1.10");
        assert_eq!(dashboard_url("192.168.1.10:8080/"), "http://192.168.1.10:8080");
        assert_eq!(dashboard_url("https://dss.local"), "https://dss.local");
    }

    #[test]
    fn test_restart_backoff_doubles_and_caps() {
        let timing = MonitorTiming::default();
        assert_eq!(timing.restart_backoff(0), Duration::from_secs(3));
        assert_eq!(timing.restart_backoff(1), Duration::from_secs(6));
        assert_eq!(timing.restart_backoff(3), Duration::from_secs(24));
        assert_eq!(timing.restart_backoff(5), Duration::from_secs(60));
        assert_eq!(timing.restart_backoff(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials {
            username: "admin".into(),
            password: "secret".into(),
        };
        let printed = format!("{:?}", creds);
        assert!(printed.contains("admin"));
        assert!(!printed.contains("secret"));
    }
}
