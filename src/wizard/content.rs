//! Persisted wizard content
//!
//! The content is a bag of plain records: names, versions and URLs only,
//! never live references into the selection graph or the repository matrix.
//! Steps flatten their state into it on submit and rebuild from it on load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::WizardStepId;
use crate::error::{Result, WizardError};
use crate::repos::MpackRecord;
use crate::selection::{mpack_version_id, service_version_id};
use crate::types::SelectionMode;

/// Choice made on the download configuration step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Whether the user wants to edit mpack and repository URLs
    pub use_custom_repo: bool,
}

/// A service group, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    pub mpack_name: String,
    pub mpack_version: String,
}

impl GroupRecord {
    pub fn mpack_version_id(&self) -> String {
        mpack_version_id(&self.mpack_name, &self.mpack_version)
    }
}

/// A service instance, flattened. The service is resolved through the
/// mpack version of its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub name: String,
    pub group_name: String,
    pub service_name: String,
}

impl InstanceRecord {
    /// Service version id, given the group this instance belongs to
    pub fn service_id(&self, group: &GroupRecord) -> String {
        service_version_id(&group.mpack_name, &group.mpack_version, &self.service_name)
    }
}

/// Everything the wizard persists between steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardContent {
    /// Host specification as typed
    pub host_names: String,
    /// Expanded hosts that will be added
    pub hosts: Vec<String>,
    /// Hosts already part of the cluster
    pub registered_hosts: Vec<String>,
    pub download_config: DownloadConfig,
    pub selection_mode: SelectionMode,
    pub selected_use_cases: Vec<String>,
    pub selected_mpacks: Vec<MpackRecord>,
    pub added_service_groups: Vec<GroupRecord>,
    pub added_service_instances: Vec<InstanceRecord>,
    /// Groups registered in the cluster before this run
    pub existing_service_groups: Vec<GroupRecord>,
    pub existing_service_instances: Vec<InstanceRecord>,
    pub current_step: WizardStepId,
    pub steps_saved_state: BTreeMap<WizardStepId, bool>,
}

impl WizardContent {
    pub fn find_mpack(&self, name: &str, version: &str) -> Option<&MpackRecord> {
        self.selected_mpacks
            .iter()
            .find(|m| m.is_same_version(name, version))
    }

    pub fn find_mpack_mut(&mut self, name: &str, version: &str) -> Option<&mut MpackRecord> {
        self.selected_mpacks
            .iter_mut()
            .find(|m| m.is_same_version(name, version))
    }

    pub fn is_step_saved(&self, step: WizardStepId) -> bool {
        self.steps_saved_state.get(&step).copied().unwrap_or(false)
    }
}

/// Storage for [`WizardContent`].
pub trait ContentStore {
    /// Load persisted content; a store with nothing saved yields the default
    fn load(&self) -> Result<WizardContent>;

    fn save(&mut self, content: &WizardContent) -> Result<()>;
}

/// Content kept in memory for the lifetime of the store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentStore {
    content: Option<WizardContent>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: WizardContent) -> Self {
        Self {
            content: Some(content),
        }
    }
}

impl ContentStore for InMemoryContentStore {
    fn load(&self) -> Result<WizardContent> {
        Ok(self.content.clone().unwrap_or_default())
    }

    fn save(&mut self, content: &WizardContent) -> Result<()> {
        self.content = Some(content.clone());
        Ok(())
    }
}

/// Content persisted as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonFileContentStore {
    path: PathBuf,
}

impl JsonFileContentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> anyhow::Result<WizardContent> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read wizard content from {:?}", self.path))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse wizard content in {:?}", self.path))
    }

    fn write(&self, content: &WizardContent) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(content)
            .context("Failed to serialize wizard content to JSON")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write wizard content to {:?}", self.path))
    }
}

impl ContentStore for JsonFileContentStore {
    fn load(&self) -> Result<WizardContent> {
        if !self.path.exists() {
            tracing::debug!("No wizard content at {:?}, starting fresh", self.path);
            return Ok(WizardContent::default());
        }
        self.read()
            .map_err(|e| WizardError::content_store(format!("{e:#}")))
    }

    fn save(&mut self, content: &WizardContent) -> Result<()> {
        self.write(content)
            .map_err(|e| WizardError::content_store(format!("{e:#}")))
    }
}
