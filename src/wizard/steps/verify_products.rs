//! Repository verification step

use std::sync::Arc;

use crate::error::Result;
use crate::provision::{
    ProvisionTarget, ProvisionTransitionError, ProvisioningOrchestrator, RepoCheck, Ticket, Transport,
};
use crate::repos::{CatalogSnapshot, MpackRepos, RepositoryMatrixBuilder};
use crate::wizard::{WizardContent, WizardStep, WizardStepId};

/// Verifies every repository of every selected operating system.
///
/// Items are keyed by the repo's global id. Item states are copied onto
/// the matrix repos after each settlement so the view can render them.
pub struct VerifyProductsStep {
    transport: Arc<dyn Transport>,
    catalog: CatalogSnapshot,
    matrix: Vec<MpackRepos>,
    orchestrator: ProvisioningOrchestrator,
}

impl std::fmt::Debug for VerifyProductsStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyProductsStep")
            .field("matrix", &self.matrix)
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl VerifyProductsStep {
    pub fn new(transport: Arc<dyn Transport>, catalog: CatalogSnapshot) -> Self {
        let orchestrator = ProvisioningOrchestrator::new(transport.clone());
        Self {
            transport,
            catalog,
            matrix: Vec::new(),
            orchestrator,
        }
    }

    pub fn matrix(&self) -> &[MpackRepos] {
        &self.matrix
    }

    pub fn orchestrator(&self) -> &ProvisioningOrchestrator {
        &self.orchestrator
    }

    /// Apply settlements that already arrived
    pub fn poll(&mut self) -> usize {
        let applied = self.orchestrator.poll_settled();
        self.sync_statuses();
        applied
    }

    pub async fn settle_all(&mut self) {
        self.orchestrator.settle_all().await;
        self.sync_statuses();
    }

    pub fn retry(&mut self, repo_uid: &str) -> std::result::Result<Ticket, ProvisionTransitionError> {
        let ticket = self.orchestrator.retry(repo_uid)?;
        self.sync_statuses();
        Ok(ticket)
    }

    fn sync_statuses(&mut self) {
        for mpack in &mut self.matrix {
            for repo in mpack.repos_mut() {
                if let Some(item) = self.orchestrator.get(&repo.id) {
                    repo.status = item.state;
                    repo.failure_message = item.failure_message().map(str::to_string);
                }
            }
        }
    }
}

impl WizardStep for VerifyProductsStep {
    fn id(&self) -> WizardStepId {
        WizardStepId::VerifyProducts
    }

    /// Must run inside a Tokio runtime: checks start immediately.
    fn load(&mut self, content: &WizardContent) -> Result<()> {
        self.matrix = RepositoryMatrixBuilder::build_for_records(&content.selected_mpacks, &self.catalog);
        self.orchestrator = ProvisioningOrchestrator::new(self.transport.clone());

        let mut targets = Vec::new();
        for mpack in &self.matrix {
            for os in mpack.operating_systems.iter().filter(|os| os.selected) {
                for repo in &os.repos {
                    let check = RepoCheck {
                        repo_id: repo.repo_id.clone(),
                        os_type: os.os_type.clone(),
                        url: repo.download_url.clone(),
                    };
                    targets.push((repo.id.clone(), ProvisionTarget::VerifyRepo(check)));
                }
            }
        }
        self.orchestrator.launch(targets)?;
        self.sync_statuses();
        tracing::info!("Verifying {} repositor(ies)", self.orchestrator.items().len());
        Ok(())
    }

    fn can_advance(&self) -> bool {
        self.orchestrator.can_advance()
    }

    fn save(&self, _content: &mut WizardContent) {}
}
