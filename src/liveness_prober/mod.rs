//! LivenessProber - Out-of-band session keepalive
//!
//! ## Responsibilities
//!
//! - Send `global.keepAlive` over the dashboard RPC channel
//! - Report a plain boolean verdict to the AlarmPoller
//!
//! The probe never returns an error. Transport failures, timeouts, non-200
//! statuses and unparseable bodies all count as a dead session.

use crate::error::{Error, Result};
use crate::models::Session;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// RPC endpoint under the dashboard host
pub const RPC_PATH: &str = "/RPC2";

/// Keepalive request constants
mod keepalive {
    pub const METHOD: &str = "global.keepAlive";
    pub const TIMEOUT: u32 = 300;
    pub const REQUEST_ID: u32 = 100;
}

/// Session liveness check used by the AlarmPoller
#[async_trait]
pub trait LivenessCheck: Send + Sync {
    /// `true` only when the dashboard confirms the session is alive
    async fn check(&self, session: &Session) -> bool;
}

#[derive(Debug, Serialize)]
struct KeepAliveParams {
    timeout: u32,
    active: bool,
}

#[derive(Debug, Serialize)]
struct KeepAliveRequest<'a> {
    method: &'a str,
    params: KeepAliveParams,
    session: &'a str,
    id: u32,
}

/// Dashboard RPC reply (only the fields the probe looks at)
#[derive(Debug, Deserialize)]
struct KeepAliveResponse {
    #[serde(default)]
    result: Option<bool>,
}

/// Keepalive prober over HTTP
pub struct LivenessProber {
    client: Client,
    rpc_url: String,
    timeout: Duration,
}

impl LivenessProber {
    /// 新規作成
    ///
    /// `base_url` is the dashboard base URL (see `state::dashboard_url`).
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            rpc_url: format!("{}{}", base_url.trim_end_matches('/'), RPC_PATH),
            timeout,
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Send one keepalive and classify the reply
    async fn keep_alive(&self, token: &str) -> Result<()> {
        let body = serde_json::to_string(&KeepAliveRequest {
            method: keepalive::METHOD,
            params: KeepAliveParams {
                timeout: keepalive::TIMEOUT,
                active: true,
            },
            session: token,
            id: keepalive::REQUEST_ID,
        })?;

        let response = self
            .client
            .post(&self.rpc_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Probe(format!("keepalive request failed: {}", e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::Probe(format!("keepalive returned status {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Probe(format!("keepalive body unreadable: {}", e)))?;
        let parsed: KeepAliveResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Probe(format!("keepalive body malformed: {}", e)))?;

        if parsed.result == Some(false) {
            return Err(Error::Probe("keepalive rejected by dashboard".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl LivenessCheck for LivenessProber {
    async fn check(&self, session: &Session) -> bool {
        match self.keep_alive(&session.token).await {
            Ok(()) => {
                tracing::debug!(generation = session.generation, "Keepalive acknowledged");
                true
            }
            Err(e) => {
                tracing::warn!(
                    generation = session.generation,
                    url = %self.rpc_url,
                    error = %e,
                    "Keepalive failed - session considered expired"
                );
                false
            }
        }
    }
}
