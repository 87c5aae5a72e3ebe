//! Mpack download step

use std::sync::Arc;

use crate::error::Result;
use crate::provision::{
    ProvisionItem, ProvisionTarget, ProvisionTransitionError, ProvisioningOrchestrator, Ticket, Transport,
};
use crate::selection::mpack_version_id;
use crate::wizard::{WizardContent, WizardStep, WizardStepId};

/// Asks the server to download every selected mpack.
///
/// Items are keyed by mpack version id. Loading the step starts a fresh
/// orchestrator; results of a previous visit are discarded.
pub struct DownloadMpacksStep {
    transport: Arc<dyn Transport>,
    orchestrator: ProvisioningOrchestrator,
}

impl std::fmt::Debug for DownloadMpacksStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadMpacksStep")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl DownloadMpacksStep {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let orchestrator = ProvisioningOrchestrator::new(transport.clone());
        Self {
            transport,
            orchestrator,
        }
    }

    pub fn items(&self) -> &[ProvisionItem] {
        self.orchestrator.items()
    }

    pub fn orchestrator(&self) -> &ProvisioningOrchestrator {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut ProvisioningOrchestrator {
        &mut self.orchestrator
    }

    pub fn retry(&mut self, mpack_version_id: &str) -> std::result::Result<Ticket, ProvisionTransitionError> {
        self.orchestrator.retry(mpack_version_id)
    }

    /// Wait for every download to settle
    pub async fn settle_all(&mut self) {
        self.orchestrator.settle_all().await;
    }
}

impl WizardStep for DownloadMpacksStep {
    fn id(&self) -> WizardStepId {
        WizardStepId::DownloadMpacks
    }

    /// Must run inside a Tokio runtime: downloads start immediately.
    fn load(&mut self, content: &WizardContent) -> Result<()> {
        self.orchestrator = ProvisioningOrchestrator::new(self.transport.clone());
        let targets = content.selected_mpacks.iter().map(|mpack| {
            (
                mpack_version_id(&mpack.name, &mpack.version),
                ProvisionTarget::DownloadMpack {
                    name: mpack.name.clone(),
                    url: mpack.download_url.clone(),
                },
            )
        });
        self.orchestrator.launch(targets)?;
        tracing::info!("Downloading {} mpack(s)", self.orchestrator.items().len());
        Ok(())
    }

    fn can_advance(&self) -> bool {
        self.orchestrator.can_advance()
    }

    fn save(&self, _content: &mut WizardContent) {}
}
