//! Wizard configuration file handling.
//!
//! The configuration is a small JSON document describing how to reach the
//! management server. Loading attaches the path to every failure so the CLI
//! can print a useful message without more plumbing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Connection settings for the provisioning transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Server base URL, e.g. `http://ambari.local:8080`
    pub base_url: String,
    /// Value of the `X-Requested-By` header sent with every mutation
    pub requested_by: String,
    /// Delay before the repository verification stub reports success
    pub verify_delay_ms: u64,
    pub http_timeout_secs: u64,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            requested_by: "ambari".to_string(),
            verify_delay_ms: 1000,
            http_timeout_secs: 60,
        }
    }
}

impl WizardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file. Missing keys take their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse configuration JSON in {:?}", path.as_ref()))?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            anyhow::bail!("Server base URL must be specified");
        }

        let parsed = url::Url::parse(base_url)
            .with_context(|| format!("Server base URL {:?} is not a valid URL", base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Server base URL must use http or https, got {}", parsed.scheme());
        }

        if self.requested_by.trim().is_empty() {
            anyhow::bail!("X-Requested-By value must be specified");
        }
        if self.http_timeout_secs == 0 {
            anyhow::bail!("HTTP timeout must be greater than zero");
        }
        if self.verify_delay_ms == 0 {
            anyhow::bail!("Repository verification delay must be greater than zero");
        }

        Ok(())
    }
}
