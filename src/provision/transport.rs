//! Transport collaborator for provisioning items
//!
//! The orchestrator only sees the [`Transport`] trait. [`HttpTransport`]
//! talks to the cluster management server over HTTP; repository
//! verification is a scheduled no-op until the server grows a real check.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::WizardConfig;
use crate::error::{Result, WizardError};

/// Failure reported by the transport, shaped like an HTTP response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status_text} (status {})", display_status(.status))]
pub struct TransportError {
    /// HTTP status, `None` when no response was received
    pub status: Option<u16>,
    pub status_text: String,
}

fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

impl TransportError {
    pub fn new(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            status_text: status_text.into(),
        }
    }

    /// Failure without any response (connection refused, timeout)
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            status_text: message.into(),
        }
    }
}

/// Server-side resource created by an mpack download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpackResource {
    pub resource_id: Option<String>,
}

/// Repository to verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCheck {
    pub repo_id: String,
    pub os_type: String,
    pub url: String,
}

/// External operations a provisioning item can dispatch.
pub trait Transport: Send + Sync {
    /// Ask the server to download and register an mpack.
    fn download_mpack(&self, name: &str, url: &str) -> BoxFuture<'static, std::result::Result<MpackResource, TransportError>>;

    /// Check that a repository is reachable.
    fn verify_repo(&self, repo: &RepoCheck) -> BoxFuture<'static, std::result::Result<(), TransportError>>;
}

/// HTTP implementation of [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    requested_by: String,
    verify_delay: Duration,
}

impl HttpTransport {
    /// Build a transport from a validated configuration
    pub fn new(config: &WizardConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| WizardError::config(format!("{e:#}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| WizardError::transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            requested_by: config.requested_by.clone(),
            verify_delay: Duration::from_millis(config.verify_delay_ms),
        })
    }

    fn mpacks_endpoint(&self) -> String {
        format!("{}/api/v1/mpacks", self.base_url)
    }
}

/// Pull `MpackInfo.mpack_id` out of a creation response, if present
fn resource_id_from(body: &serde_json::Value) -> Option<String> {
    let id = body.get("MpackInfo")?.get("mpack_id")?;
    match id {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Transport for HttpTransport {
    fn download_mpack(&self, name: &str, url: &str) -> BoxFuture<'static, std::result::Result<MpackResource, TransportError>> {
        let request = self
            .client
            .post(self.mpacks_endpoint())
            .header("X-Requested-By", &self.requested_by)
            .json(&json!({
                "MpackInfo": {
                    "mpack_name": name,
                    "mpack_uri": url,
                }
            }));
        let name = name.to_string();

        async move {
            tracing::debug!("Requesting download of mpack {}", name);
            let response = request
                .send()
                .await
                .map_err(|e| TransportError {
                    status: e.status().map(|s| s.as_u16()),
                    status_text: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::new(
                    status.as_u16(),
                    status.canonical_reason().unwrap_or_default(),
                ));
            }

            // Body is optional; an empty 201 still counts as created.
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            Ok(MpackResource {
                resource_id: resource_id_from(&body),
            })
        }
        .boxed()
    }

    fn verify_repo(&self, repo: &RepoCheck) -> BoxFuture<'static, std::result::Result<(), TransportError>> {
        let delay = self.verify_delay;
        let repo_id = repo.repo_id.clone();
        async move {
            tokio::time::sleep(delay).await;
            tracing::debug!("Repository {} verified", repo_id);
            Ok(())
        }
        .boxed()
    }
}
