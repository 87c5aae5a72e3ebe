//! Repository URL customization step

use crate::error::Result;
use crate::repos::{CatalogSnapshot, MpackRepos, RepositoryMatrixBuilder};
use crate::wizard::{WizardContent, WizardStep, WizardStepId};

/// Edits the per-OS repository URLs of every selected mpack version.
///
/// The matrix is rebuilt from the persisted records on each load, so URL
/// edits survive only through `save`.
#[derive(Debug, Clone, Default)]
pub struct CustomProductReposStep {
    catalog: CatalogSnapshot,
    matrix: Vec<MpackRepos>,
    edited: bool,
}

impl CustomProductReposStep {
    pub fn new(catalog: CatalogSnapshot) -> Self {
        Self {
            catalog,
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> &[MpackRepos] {
        &self.matrix
    }

    /// Set the download URL of a repo by its global id
    pub fn set_repo_url(&mut self, repo_uid: &str, url: &str) -> bool {
        let Some(repo) = self.matrix.iter_mut().find_map(|m| m.find_repo_mut(repo_uid)) else {
            return false;
        };
        repo.set_download_url(url);
        self.edited = true;
        true
    }

    pub fn reset_repo_url(&mut self, repo_uid: &str) -> bool {
        let Some(repo) = self.matrix.iter_mut().find_map(|m| m.find_repo_mut(repo_uid)) else {
            return false;
        };
        repo.reset_download_url();
        self.edited = true;
        true
    }

    pub fn set_os_selected(&mut self, mpack_version_id: &str, os_type: &str, selected: bool) -> bool {
        let changed = self
            .matrix
            .iter_mut()
            .find(|m| m.mpack_version_id == mpack_version_id)
            .is_some_and(|m| m.set_os_selected(os_type, selected));
        self.edited |= changed;
        changed
    }

    /// Problems blocking the step
    pub fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for mpack in &self.matrix {
            if !mpack.operating_systems.iter().any(|os| os.selected) {
                errors.push(format!(
                    "Select at least one operating system for {} {}",
                    mpack.name, mpack.version
                ));
            }
            errors.extend(mpack.selected_repos().filter_map(|r| r.url_error()));
        }
        errors
    }
}

impl WizardStep for CustomProductReposStep {
    fn id(&self) -> WizardStepId {
        WizardStepId::CustomProductRepos
    }

    fn load(&mut self, content: &WizardContent) -> Result<()> {
        self.matrix = RepositoryMatrixBuilder::build_for_records(&content.selected_mpacks, &self.catalog);
        self.edited = false;
        Ok(())
    }

    fn can_advance(&self) -> bool {
        self.errors().is_empty()
    }

    fn save(&self, content: &mut WizardContent) {
        for mpack in &self.matrix {
            if let Some(record) = content.find_mpack_mut(&mpack.name, &mpack.version) {
                record.store_repos(mpack);
            }
        }
    }

    fn take_edited(&mut self) -> bool {
        std::mem::take(&mut self.edited)
    }
}
