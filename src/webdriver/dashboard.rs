//! Alarm dashboard driven through a browser
//!
//! Element locators of the vendor dashboard:
//!
//! | Affordance          | XPath                              |
//! |---------------------|------------------------------------|
//! | Username field      | `//input[@id='username']`          |
//! | Password field      | `//input[@id='password']`          |
//! | Login button        | `//a[@id='ulgin']`                 |
//! | Alarm center menu   | `//a[@id='xbjsz']`                 |
//! | Alarm tracking box  | `//input[@id='alarmType_1']`       |
//! | Alarm feed iframe   | `//iframe[@id='alarm_frame']`      |

use super::client::WebDriverClient;
use crate::dashboard::{DashboardDriver, SignalSource};
use crate::error::{Error, Result};
use crate::models::Session;
use crate::state::{BrowserConfig, Credentials};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

mod locators {
    pub const USERNAME: &str = "//input[@id='username']";
    pub const PASSWORD: &str = "//input[@id='password']";
    pub const LOGIN_BUTTON: &str = "//a[@id='ulgin']";
    pub const ALARM_CENTER: &str = "//a[@id='xbjsz']";
    pub const ALARM_TRACKING: &str = "//input[@id='alarmType_1']";
    pub const ALARM_FRAME: &str = "//iframe[@id='alarm_frame']";
}

/// Rendered text of every `div` in document order
///
/// Wrappers are included: a record whose fields sit in child `div`s only
/// has its four lines on the parent. Hidden elements yield `''`.
const FEED_BLOCKS_SCRIPT: &str = r#"
return Array.from(document.querySelectorAll('div')).map(function (d) {
    if (!d.getClientRects().length) { return ''; }
    return (d.innerText || '').trim();
});
"#;

const COOKIE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser-backed dashboard adapter
pub struct DashboardBrowser {
    client: WebDriverClient,
    browser: BrowserConfig,
    dashboard_url: String,
    ready_timeout: Duration,
}

impl DashboardBrowser {
    /// 新規作成
    pub fn new(dashboard_url: &str, browser: BrowserConfig, ready_timeout: Duration) -> Self {
        Self {
            client: WebDriverClient::new(&browser.webdriver_url),
            browser,
            dashboard_url: dashboard_url.to_string(),
            ready_timeout,
        }
    }

    /// Wait for an affordance, failing with `missing` when it never shows up
    async fn ready(&self, xpath: &str, missing: impl Fn(String) -> Error) -> Result<String> {
        self.client
            .wait_for_element(xpath, self.ready_timeout)
            .await?
            .ok_or_else(|| {
                missing(format!(
                    "{} not available after {:?}",
                    xpath, self.ready_timeout
                ))
            })
    }

    async fn submit_login(&mut self, credentials: &Credentials) -> Result<String> {
        if self.client.has_session() {
            self.client.delete_session().await?;
        }
        self.client.start_session(&self.browser).await?;
        self.client.navigate(&self.dashboard_url).await?;

        let username = self.ready(locators::USERNAME, Error::Auth).await?;
        self.client.clear(&username).await?;
        self.client.send_keys(&username, &credentials.username).await?;

        let password = self.ready(locators::PASSWORD, Error::Auth).await?;
        self.client.clear(&password).await?;
        self.client.send_keys(&password, &credentials.password).await?;

        let button = self.ready(locators::LOGIN_BUTTON, Error::Auth).await?;
        self.client.click(&button).await?;

        self.wait_for_session_cookie().await
    }

    /// The dashboard only sets its session cookie after accepting the login
    async fn wait_for_session_cookie(&self) -> Result<String> {
        let deadline = Instant::now() + self.ready_timeout;
        loop {
            let token = self
                .client
                .cookies()
                .await?
                .into_iter()
                .find(|c| c.name == self.browser.session_cookie && !c.value.is_empty())
                .map(|c| c.value);
            if let Some(token) = token {
                return Ok(token);
            }
            if Instant::now() >= deadline {
                return Err(Error::Auth(format!(
                    "login rejected: no {} cookie after {:?}",
                    self.browser.session_cookie, self.ready_timeout
                )));
            }
            tokio::time::sleep(COOKIE_POLL_INTERVAL).await;
        }
    }

    async fn open_alarm_feed(&self) -> Result<()> {
        self.client.switch_to_frame(None).await?;

        let menu = self.ready(locators::ALARM_CENTER, Error::Navigation).await?;
        self.client.click(&menu).await?;

        let tracking = self.ready(locators::ALARM_TRACKING, Error::Navigation).await?;
        self.client.click(&tracking).await?;

        let frame = self.ready(locators::ALARM_FRAME, Error::Navigation).await?;
        self.client.switch_to_frame(Some(&frame)).await
    }
}

#[async_trait]
impl SignalSource for DashboardBrowser {
    async fn fetch_blocks(&mut self) -> Result<Vec<String>> {
        self.client.execute(FEED_BLOCKS_SCRIPT).await
    }
}

#[async_trait]
impl DashboardDriver for DashboardBrowser {
    async fn login(&mut self, credentials: &Credentials) -> Result<String> {
        tracing::info!(
            url = %self.dashboard_url,
            username = %credentials.username,
            "Logging in to alarm dashboard"
        );
        self.submit_login(credentials).await.map_err(|e| match e {
            Error::Auth(_) => e,
            other => Error::Auth(format!("login failed: {}", other)),
        })
    }

    async fn enable_tracking(&mut self, session: &Session) -> Result<()> {
        tracing::info!(generation = session.generation, "Enabling alarm tracking");
        self.open_alarm_feed().await.map_err(|e| match e {
            Error::Navigation(_) => e,
            other => Error::Navigation(format!("alarm center unavailable: {}", other)),
        })
    }

    async fn end_session(&mut self) -> Result<()> {
        self.client.delete_session().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm_poller::FeedRecord;
    use crate::webdriver::client::ELEMENT_KEY;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// In-memory WebDriver server imitating the dashboard
    #[derive(Default)]
    struct FakeDriver {
        /// XPaths that never resolve
        missing: Vec<&'static str>,
        /// Cookie value set once the login button is clicked
        token: Option<&'static str>,
        clicked: Mutex<Vec<String>>,
        typed: Mutex<Vec<(String, String)>>,
        logged_in: Mutex<bool>,
        frame: Mutex<Option<String>>,
        /// Blocks rendered inside the alarm frame
        feed: Vec<&'static str>,
        scripts: Mutex<Vec<String>>,
    }

    fn element_id(xpath: &str) -> Option<&'static str> {
        match xpath {
            locators::USERNAME => Some("el-user"),
            locators::PASSWORD => Some("el-pass"),
            locators::LOGIN_BUTTON => Some("el-login"),
            locators::ALARM_CENTER => Some("el-menu"),
            locators::ALARM_TRACKING => Some("el-tracking"),
            locators::ALARM_FRAME => Some("el-frame"),
            _ => None,
        }
    }

    async fn spawn_driver(driver: Arc<FakeDriver>) -> String {
        let app = Router::new()
            .route("/session", post(|| async { Json(json!({"value": {"sessionId": "s1", "capabilities": {}}})) }))
            .route("/session/{id}", delete(|| async { Json(json!({"value": null})) }))
            .route("/session/{id}/url", post(|| async { Json(json!({"value": null})) }))
            .route(
                "/session/{id}/element",
                post(|State(d): State<Arc<FakeDriver>>, Json(body): Json<Value>| async move {
                    let xpath = body["value"].as_str().unwrap_or_default().to_string();
                    match element_id(&xpath) {
                        Some(id) if !d.missing.iter().any(|m| *m == xpath) => (
                            StatusCode::OK,
                            Json(json!({"value": {"element-6066-11e4-a52e-4f735466cecf": id}})),
                        ),
                        _ => (
                            StatusCode::NOT_FOUND,
                            Json(json!({"value": {"error": "no such element", "message": xpath}})),
                        ),
                    }
                }),
            )
            .route("/session/{id}/element/{el}/clear", post(|| async { Json(json!({"value": null})) }))
            .route(
                "/session/{id}/element/{el}/value",
                post(|State(d): State<Arc<FakeDriver>>, Path((_, el)): Path<(String, String)>, Json(body): Json<Value>| async move {
                    let text = body["text"].as_str().unwrap_or_default().to_string();
                    d.typed.lock().unwrap().push((el, text));
                    Json(json!({"value": null}))
                }),
            )
            .route(
                "/session/{id}/element/{el}/click",
                post(|State(d): State<Arc<FakeDriver>>, Path((_, el)): Path<(String, String)>| async move {
                    if el == "el-login" {
                        *d.logged_in.lock().unwrap() = true;
                    }
                    d.clicked.lock().unwrap().push(el);
                    Json(json!({"value": null}))
                }),
            )
            .route(
                "/session/{id}/cookie",
                get(|State(d): State<Arc<FakeDriver>>| async move {
                    let logged_in = *d.logged_in.lock().unwrap();
                    let cookies = match d.token {
                        Some(token) if logged_in => json!([{"name": "DhWebClientSessionID", "value": token}]),
                        _ => json!([{"name": "lang", "value": "en"}]),
                    };
                    Json(json!({"value": cookies}))
                }),
            )
            .route(
                "/session/{id}/frame",
                post(|State(d): State<Arc<FakeDriver>>, Json(body): Json<Value>| async move {
                    *d.frame.lock().unwrap() = body["id"][ELEMENT_KEY]
                        .as_str()
                        .map(String::from);
                    Json(json!({"value": null}))
                }),
            )
            .route(
                "/session/{id}/execute/sync",
                post(|State(d): State<Arc<FakeDriver>>, Json(body): Json<Value>| async move {
                    d.scripts
                        .lock()
                        .unwrap()
                        .push(body["script"].as_str().unwrap_or_default().to_string());
                    let blocks = if d.frame.lock().unwrap().as_deref() == Some("el-frame") {
                        json!(d.feed)
                    } else {
                        json!([])
                    };
                    Json(json!({"value": blocks}))
                }),
            )
            .with_state(driver);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn browser(webdriver_url: String) -> DashboardBrowser {
        let config = BrowserConfig {
            webdriver_url,
            ..BrowserConfig::default()
        };
        DashboardBrowser::new("http://dashboard.local", config, Duration::from_millis(300))
    }

    fn credentials() -> Credentials {
        Credentials {
            username: "admin".into(),
            password: "pw".into(),
        }
    }

    #[tokio::test]
    async fn test_full_flow_reads_alarm_frame() {
        let driver = Arc::new(FakeDriver {
            token: Some("tok123"),
            feed: vec!["a1\n2024-01-01\nmotion\n102", "Alarm list"],
            ..FakeDriver::default()
        });
        let mut dashboard = browser(spawn_driver(driver.clone()).await);

        let token = dashboard.login(&credentials()).await.unwrap();
        assert_eq!(token, "tok123");
        assert_eq!(
            *driver.typed.lock().unwrap(),
            vec![
                ("el-user".to_string(), "admin".to_string()),
                ("el-pass".to_string(), "pw".to_string()),
            ]
        );

        let session = Session::new(token, 1);
        dashboard.enable_tracking(&session).await.unwrap();
        assert_eq!(
            *driver.clicked.lock().unwrap(),
            vec!["el-login", "el-menu", "el-tracking"]
        );

        let blocks = dashboard.fetch_blocks().await.unwrap();
        assert_eq!(blocks[0], "a1\n2024-01-01\nmotion\n102");

        dashboard.end_session().await.unwrap();
        assert!(dashboard.fetch_blocks().await.is_err());
    }

    #[tokio::test]
    async fn test_record_split_across_child_divs_is_read_from_wrapper() {
        // <div><div>a1</div><div>2024-01-01</div><div>motion</div><div>102</div></div>
        let driver = Arc::new(FakeDriver {
            token: Some("tok123"),
            feed: vec![
                "a1\n2024-01-01\nmotion\n102",
                "a1",
                "2024-01-01",
                "motion",
                "102",
                "",
            ],
            ..FakeDriver::default()
        });
        let mut dashboard = browser(spawn_driver(driver.clone()).await);
        let token = dashboard.login(&credentials()).await.unwrap();
        dashboard.enable_tracking(&Session::new(token, 1)).await.unwrap();

        let blocks = dashboard.fetch_blocks().await.unwrap();
        let records: Vec<FeedRecord> = blocks
            .iter()
            .filter_map(|b| FeedRecord::parse(b).ok())
            .collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_id, "a1");
        assert_eq!(records[0].camera_raw_id, "102");

        // Every div is read, wrappers included
        let scripts = driver.scripts.lock().unwrap();
        assert!(scripts[0].contains("querySelectorAll('div')"));
        assert!(!scripts[0].contains("filter"));
    }

    #[tokio::test]
    async fn test_missing_login_field_is_auth_error() {
        let driver = Arc::new(FakeDriver {
            missing: vec![locators::PASSWORD],
            token: Some("tok123"),
            ..FakeDriver::default()
        });
        let mut dashboard = browser(spawn_driver(driver.clone()).await);

        let err = dashboard.login(&credentials()).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        // Login is never submitted without both fields
        assert!(driver.clicked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_session_cookie_is_auth_error() {
        let driver = Arc::new(FakeDriver::default());
        let mut dashboard = browser(spawn_driver(driver).await);

        let err = dashboard.login(&credentials()).await.unwrap_err();
        assert!(matches!(err, Error::Auth(msg) if msg.contains("login rejected")));
    }

    #[tokio::test]
    async fn test_missing_tracking_box_is_navigation_error() {
        let driver = Arc::new(FakeDriver {
            missing: vec![locators::ALARM_TRACKING],
            token: Some("tok123"),
            ..FakeDriver::default()
        });
        let mut dashboard = browser(spawn_driver(driver).await);

        let token = dashboard.login(&credentials()).await.unwrap();
        let err = dashboard
            .enable_tracking(&Session::new(token, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Navigation(_)));
    }

    #[tokio::test]
    async fn test_unreachable_webdriver_is_auth_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut dashboard = browser(format!("http://{}", addr));
        let err = dashboard.login(&credentials()).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
