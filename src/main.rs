//! Alarm Center Relay
//!
//! Main entry point. Loads the camera list, then runs the session
//! controller until the process is terminated.

use alarm_center_relay::{
    alarm_poller::AlarmPoller,
    camera_directory::CameraDirectory,
    liveness_prober::LivenessProber,
    notification_sink::ConsoleSink,
    session_controller::SessionController,
    state::{defaults, AppConfig, BrowserConfig, Credentials, MonitorTiming},
    webdriver::DashboardBrowser,
    dashboard::DashboardDriver,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "alarm-center-relay")]
#[command(about = "Alarm Center connector - forwards new dashboard alarms")]
struct Args {
    /// Dashboard host (e.g. 192.168.1.10 or http://192.168.1.10:8080)
    #[arg(long)]
    host: String,

    /// Username for login
    #[arg(long)]
    username: String,

    /// Password for login
    #[arg(long)]
    password: String,

    /// Camera list JSON file ({"<camera id>": "<name>"})
    #[arg(long)]
    camera_list: PathBuf,

    /// WebDriver server URL
    #[arg(long, env = "WEBDRIVER_URL", default_value = defaults::WEBDRIVER_URL)]
    webdriver_url: String,

    /// Browser user agent override
    #[arg(long, env = "DASHBOARD_USER_AGENT", default_value = defaults::USER_AGENT)]
    user_agent: String,

    /// Cookie carrying the dashboard session token
    #[arg(long, env = "DASHBOARD_SESSION_COOKIE", default_value = defaults::SESSION_COOKIE)]
    session_cookie: String,

    /// Run the browser without a window (env accepts true/false, 1/0, yes/no, on/off)
    #[arg(
        long,
        env = "BROWSER_HEADLESS",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    headless: bool,

    /// Seconds between feed scans
    #[arg(long, default_value_t = defaults::POLL_INTERVAL_SECS)]
    poll_interval_secs: u64,

    /// Base seconds between sessions
    #[arg(long, default_value_t = defaults::RESTART_DELAY_SECS)]
    restart_delay_secs: u64,

    /// Seconds to wait for a dashboard element
    #[arg(long, default_value_t = defaults::READY_TIMEOUT_SECS)]
    ready_timeout_secs: u64,

    /// Keepalive request timeout in seconds
    #[arg(long, default_value_t = defaults::PROBE_TIMEOUT_SECS)]
    probe_timeout_secs: u64,
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            credentials: Credentials {
                username: args.username,
                password: args.password,
            },
            camera_list: args.camera_list,
            timing: MonitorTiming {
                poll_interval: Duration::from_secs(args.poll_interval_secs),
                restart_delay: Duration::from_secs(args.restart_delay_secs),
                ready_timeout: Duration::from_secs(args.ready_timeout_secs),
                probe_timeout: Duration::from_secs(args.probe_timeout_secs),
                ..MonitorTiming::default()
            },
            browser: BrowserConfig {
                webdriver_url: args.webdriver_url,
                user_agent: args.user_agent,
                headless: args.headless,
                session_cookie: args.session_cookie,
            },
        }
    }
}

async fn load_directory(config: &AppConfig) -> anyhow::Result<Arc<CameraDirectory>> {
    match CameraDirectory::load(&config.camera_list).await {
        Ok(directory) => {
            tracing::info!(cameras = directory.len(), "Camera list loaded");
            Ok(Arc::new(directory))
        }
        Err(e) => {
            tracing::error!(error = %e, "Loading camera list failed");
            Err(e.into())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alarm_center_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Alarm Center Relay v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from(Args::parse());
    let dashboard_url = config.dashboard_url();
    tracing::info!(
        dashboard = %dashboard_url,
        camera_list = %config.camera_list.display(),
        webdriver = %config.browser.webdriver_url,
        poll_interval_secs = config.timing.poll_interval.as_secs(),
        "Configuration loaded"
    );

    // Camera list problems are the only fatal error
    let directory = load_directory(&config).await?;

    let prober = Arc::new(LivenessProber::new(&dashboard_url, config.timing.probe_timeout));
    let poller = AlarmPoller::new(
        directory,
        prober,
        Arc::new(ConsoleSink::new()),
        config.timing.clone(),
    );
    let browser = DashboardBrowser::new(
        &dashboard_url,
        config.browser.clone(),
        config.timing.ready_timeout,
    );
    let mut controller =
        SessionController::new(browser, poller, config.credentials.clone(), config.timing.clone());

    tokio::select! {
        _ = controller.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
    }

    if let Err(e) = controller.driver_mut().end_session().await {
        tracing::warn!(error = %e, "Failed to close browser session");
    }

    tracing::info!("Alarm Center Relay stopped");
    Ok(())
}
