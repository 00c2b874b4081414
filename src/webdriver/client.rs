//! W3C WebDriver HTTP client
//!
//! Minimal subset of the WebDriver protocol used by the dashboard adapter:
//! session lifecycle, navigation, element lookup/interaction, frames,
//! cookies and synchronous script execution.

use crate::error::{Error, Result};
use crate::state::BrowserConfig;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;

/// W3C WebDriver web element reference key
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Interval between element lookups while waiting for readiness
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Protocol-level error returned by the driver
#[derive(Debug, Clone, Deserialize)]
pub struct DriverError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl DriverError {
    pub fn is_no_such_element(&self) -> bool {
        self.error == "no such element"
    }

    /// The session is already gone on the driver side
    pub fn is_invalid_session(&self) -> bool {
        self.error == "invalid session id"
    }
}

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Error::WebDriver(format!("{}: {}", e.error, e.message))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct ElementRef {
    #[serde(rename = "element-6066-11e4-a52e-4f735466cecf")]
    id: String,
}

/// Browser cookie as reported by the driver
#[derive(Debug, Clone, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// WebDriver client bound to at most one browser session
pub struct WebDriverClient {
    http: Client,
    base_url: String,
    session_id: Option<String>,
}

impl WebDriverClient {
    /// 新規作成
    pub fn new(webdriver_url: &str) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            base_url: webdriver_url.trim_end_matches('/').to_string(),
            session_id: None,
        }
    }

    pub fn has_session(&self) -> bool {
        self.session_id.is_some()
    }

    /// Launch a browser with the configured user agent
    pub async fn start_session(&mut self, browser: &BrowserConfig) -> Result<()> {
        let mut args = Vec::new();
        if browser.headless {
            args.push("-headless");
        }
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "firefox",
                    "moz:firefoxOptions": {
                        "args": args,
                        "prefs": { "general.useragent.override": browser.user_agent }
                    }
                }
            }
        });

        let created: NewSession = self
            .request(Method::POST, "/session".to_string(), Some(capabilities))
            .await?;

        tracing::info!(
            webdriver = %self.base_url,
            session_id = %created.session_id,
            "Browser session started"
        );
        self.session_id = Some(created.session_id);
        Ok(())
    }

    /// Close the browser session (no-op without one)
    ///
    /// The session id is kept when the driver could not close it, so the
    /// next call can retry instead of leaking a live browser.
    pub async fn delete_session(&mut self) -> Result<()> {
        let Some(id) = self.session_id.clone() else {
            return Ok(());
        };
        let path = format!("/session/{}", id);
        match self.try_request::<Value>(Method::DELETE, path, None).await? {
            Ok(_) => {
                tracing::debug!(session_id = %id, "Browser session closed");
            }
            Err(e) if e.is_invalid_session() => {
                tracing::debug!(session_id = %id, "Browser session already gone");
            }
            Err(e) => return Err(e.into()),
        }
        self.session_id = None;
        Ok(())
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        let _: Value = self
            .session_request(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    /// Look up one element by XPath; `None` when it does not exist yet
    pub async fn find_element(&self, xpath: &str) -> Result<Option<String>> {
        let body = json!({ "using": "xpath", "value": xpath });
        let path = self.session_path("/element")?;
        match self.try_request::<ElementRef>(Method::POST, path, Some(body)).await? {
            Ok(element) => Ok(Some(element.id)),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Poll for an element until it appears or `timeout` elapses
    pub async fn wait_for_element(&self, xpath: &str, timeout: Duration) -> Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(id) = self.find_element(xpath).await? {
                return Ok(Some(id));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    pub async fn clear(&self, element: &str) -> Result<()> {
        let _: Value = self
            .session_request(Method::POST, &format!("/element/{}/clear", element), Some(json!({})))
            .await?;
        Ok(())
    }

    pub async fn send_keys(&self, element: &str, text: &str) -> Result<()> {
        let _: Value = self
            .session_request(
                Method::POST,
                &format!("/element/{}/value", element),
                Some(json!({ "text": text })),
            )
            .await?;
        Ok(())
    }

    pub async fn click(&self, element: &str) -> Result<()> {
        let _: Value = self
            .session_request(Method::POST, &format!("/element/{}/click", element), Some(json!({})))
            .await?;
        Ok(())
    }

    /// Switch into an iframe element, or back to the top document with `None`
    pub async fn switch_to_frame(&self, element: Option<&str>) -> Result<()> {
        let id = match element {
            Some(element) => {
                let mut reference = serde_json::Map::new();
                reference.insert(ELEMENT_KEY.to_string(), Value::String(element.to_string()));
                Value::Object(reference)
            }
            None => Value::Null,
        };
        let _: Value = self
            .session_request(Method::POST, "/frame", Some(json!({ "id": id })))
            .await?;
        Ok(())
    }

    pub async fn cookies(&self) -> Result<Vec<Cookie>> {
        self.session_request(Method::GET, "/cookie", None).await
    }

    /// Run a synchronous script in the current browsing context
    pub async fn execute<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        self.session_request(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": [] })),
        )
        .await
    }

    fn session_path(&self, suffix: &str) -> Result<String> {
        let id = self
            .session_id
            .as_deref()
            .ok_or_else(|| Error::WebDriver("no browser session".to_string()))?;
        Ok(format!("/session/{}{}", id, suffix))
    }

    async fn session_request<T: DeserializeOwned>(
        &self,
        method: Method,
        suffix: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let path = self.session_path(suffix)?;
        self.request(method, path, body).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: String,
        body: Option<Value>,
    ) -> Result<T> {
        self.try_request(method, path, body).await?.map_err(Error::from)
    }

    /// Outer error: transport/decoding. Inner error: driver said no.
    async fn try_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: String,
        body: Option<Value>,
    ) -> Result<std::result::Result<T, DriverError>> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await?;

        if status.is_success() {
            let envelope: Envelope<T> = serde_json::from_value(payload)?;
            Ok(Ok(envelope.value))
        } else {
            let envelope: Envelope<DriverError> = serde_json::from_value(payload).map_err(|_| {
                Error::WebDriver(format!("{} {} returned status {}", method, path, status))
            })?;
            tracing::debug!(
                method = %method,
                path = %path,
                status = %status,
                error = %envelope.value.error,
                "WebDriver command failed"
            );
            Ok(Err(envelope.value))
        }
    }
}
