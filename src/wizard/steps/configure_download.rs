//! Download configuration step

use crate::error::Result;
use crate::wizard::{DownloadConfig, WizardContent, WizardStep, WizardStepId};

/// Chooses between public repositories and custom URLs.
#[derive(Debug, Clone, Default)]
pub struct ConfigureDownloadStep {
    config: DownloadConfig,
    edited: bool,
}

impl ConfigureDownloadStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_custom_repo(&self) -> bool {
        self.config.use_custom_repo
    }

    pub fn set_use_custom_repo(&mut self, value: bool) {
        if self.config.use_custom_repo != value {
            self.config.use_custom_repo = value;
            self.edited = true;
        }
    }
}

impl WizardStep for ConfigureDownloadStep {
    fn id(&self) -> WizardStepId {
        WizardStepId::ConfigureDownload
    }

    fn load(&mut self, content: &WizardContent) -> Result<()> {
        self.config = content.download_config;
        self.edited = false;
        Ok(())
    }

    fn can_advance(&self) -> bool {
        true
    }

    fn save(&self, content: &mut WizardContent) {
        content.download_config = self.config;
    }

    fn take_edited(&mut self) -> bool {
        std::mem::take(&mut self.edited)
    }
}
