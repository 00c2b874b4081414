//! Error handling for Alarm Center Relay
//!
//! Only `Error::Config` is fatal. Every other variant is absorbed by the
//! SessionController and turned into a restart.

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Camera list unreadable or malformed (fatal)
    #[error("Config error: {0}")]
    Config(String),

    /// Login affordances missing or credentials rejected
    #[error("Auth error: {0}")]
    Auth(String),

    /// Alarm center / tracking affordance missing
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Keepalive failed or timed out
    #[error("Probe error: {0}")]
    Probe(String),

    /// Feed block does not have the alarm record shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// WebDriver protocol error (browser adapter)
    #[error("WebDriver error: {0}")]
    WebDriver(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error must stop the process instead of restarting the session
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_is_fatal() {
        assert!(Error::Config("missing".into()).is_fatal());
        assert!(!Error::Auth("rejected".into()).is_fatal());
        assert!(!Error::Navigation("no menu".into()).is_fatal());
        assert!(!Error::Probe("timeout".into()).is_fatal());
        assert!(!Error::WebDriver("no such window".into()).is_fatal());
    }

    #[test]
    fn test_display_prefixes() {
        let e = Error::Auth("login button not found".into());
        assert_eq!(e.to_string(), "Auth error: login button not found");
    }
}
