//! Mpack download URL customization step

use crate::error::Result;
use crate::repos::MpackRecord;
use crate::wizard::{WizardContent, WizardStep, WizardStepId};

/// Edits the archive URL each selected mpack is downloaded from.
#[derive(Debug, Clone, Default)]
pub struct CustomMpackReposStep {
    mpacks: Vec<MpackRecord>,
    edited: bool,
}

impl CustomMpackReposStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mpacks(&self) -> &[MpackRecord] {
        &self.mpacks
    }

    /// Set the download URL of one mpack version, trimmed
    pub fn set_mpack_url(&mut self, name: &str, version: &str, url: &str) -> bool {
        let Some(mpack) = self.mpacks.iter_mut().find(|m| m.is_same_version(name, version)) else {
            return false;
        };
        mpack.download_url = url.trim().to_string();
        self.edited = true;
        true
    }

    /// Restore the registry URL of one mpack version
    pub fn reset_mpack_url(&mut self, name: &str, version: &str) -> bool {
        let Some(mpack) = self.mpacks.iter_mut().find(|m| m.is_same_version(name, version)) else {
            return false;
        };
        mpack.download_url = mpack.public_url.clone();
        self.edited = true;
        true
    }

    /// Mpacks whose URL is empty or unparsable, with the reason
    pub fn url_errors(&self) -> Vec<(String, String)> {
        self.mpacks
            .iter()
            .filter_map(|m| {
                let reason = if m.download_url.is_empty() {
                    "URL is required".to_string()
                } else {
                    url::Url::parse(&m.download_url).err()?.to_string()
                };
                Some((format!("{} {}", m.name, m.version), reason))
            })
            .collect()
    }
}

impl WizardStep for CustomMpackReposStep {
    fn id(&self) -> WizardStepId {
        WizardStepId::CustomMpackRepos
    }

    fn load(&mut self, content: &WizardContent) -> Result<()> {
        self.mpacks = content.selected_mpacks.clone();
        self.edited = false;
        Ok(())
    }

    fn can_advance(&self) -> bool {
        self.url_errors().is_empty()
    }

    fn save(&self, content: &mut WizardContent) {
        for mpack in &self.mpacks {
            if let Some(record) = content.find_mpack_mut(&mpack.name, &mpack.version) {
                record.download_url = mpack.download_url.clone();
            }
        }
    }

    fn take_edited(&mut self) -> bool {
        std::mem::take(&mut self.edited)
    }
}
