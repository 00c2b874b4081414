//! WebDriver adapter
//!
//! Drives the alarm dashboard through a real browser using the W3C
//! WebDriver protocol (geckodriver). Implements the `dashboard` traits.

pub mod client;
mod dashboard;

pub use client::{Cookie, DriverError, WebDriverClient};
pub use dashboard::DashboardBrowser;
