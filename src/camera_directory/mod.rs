//! CameraDirectory - Raw camera id → friendly name
//!
//! ## Responsibilities
//!
//! - Load the camera list JSON once at startup
//! - Resolve raw ids reported by the alarm feed
//!
//! ## File format
//! ```text
//! { "102": "Front Door", "103": "Parking" }
//! ```
//!
//! A missing or malformed file is the only fatal error of the service.
//! Lookups never fail: unknown ids resolve to themselves.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// Read-only camera name directory
#[derive(Debug, Clone, Default)]
pub struct CameraDirectory {
    names: HashMap<String, String>,
}

impl CameraDirectory {
    /// Load directory from a camera list file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!(
                "Camera list file {} could not be read: {}",
                path.display(),
                e
            ))
        })?;

        let directory = Self::from_json(&raw).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{} ({})", msg, path.display())),
            other => other,
        })?;

        tracing::info!(
            path = %path.display(),
            cameras = directory.len(),
            "Camera directory loaded"
        );

        Ok(directory)
    }

    /// Parse a flat `{"id": "name"}` JSON object
    pub fn from_json(raw: &str) -> Result<Self> {
        let names: HashMap<String, String> = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("Camera list is not a flat string map: {}", e)))?;
        Ok(Self { names })
    }

    /// Friendly name for `raw_id`, or `raw_id` itself when unmapped
    pub fn resolve(&self, raw_id: &str) -> String {
        self.names
            .get(raw_id)
            .cloned()
            .unwrap_or_else(|| raw_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl From<HashMap<String, String>> for CameraDirectory {
    fn from(names: HashMap<String, String>) -> Self {
        Self { names }
    }
}
