//! Provisioning orchestrator
//!
//! Runs independent per-item asynchronous operations (mpack downloads,
//! repository verifications) with individual retry and exposes the aggregate
//! gate a wizard step uses to decide whether it may advance.
//!
//! # Design
//!
//! Every item walks this state machine:
//!
//! ```text
//! Pending -> InProgress -> Succeeded
//!               ^   |
//!          retry|   v
//!               Failed
//! ```
//!
//! - `start` bumps the item's generation and spawns the transport future on
//!   the Tokio runtime. The spawned task reports `(id, generation, outcome)`
//!   over a channel owned by the orchestrator.
//! - Settlements are applied only when the generation matches and the item is
//!   still `InProgress`. Anything else is stale and dropped.
//! - Dropping the orchestrator drops the receiver. Operations keep running in
//!   the background but their settlements go nowhere, so a step that was
//!   left or reloaded cannot be changed by late callbacks.
//! - HTTP 409 means the resource is already registered and settles as
//!   success.
//! - [`ProvisioningOrchestrator::can_advance`] is computed on demand from the
//!   items and the error list; there is no stored flag to drift.

mod transport;

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::types::{FailureKind, ProvisionState};

pub use transport::{HttpTransport, MpackResource, RepoCheck, Transport, TransportError};

/// Shown when a failure has no status the user can act on
pub const DEFAULT_FAILURE_MESSAGE: &str = "The operation failed. Check the server logs and retry.";

/// Misuse of the provisioning state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisionTransitionError {
    #[error("Unknown provisioning item {0}")]
    UnknownItem(String),

    #[error("Provisioning item {0} is already tracked")]
    DuplicateItem(String),

    #[error("Cannot retry {id}: item is {state}, not failed")]
    InvalidRetry { id: String, state: ProvisionState },

    #[error("Provisioning item {0} already succeeded")]
    AlreadySucceeded(String),

    #[error("Provisioning item {0} is already in progress")]
    AlreadyInProgress(String),
}

/// Work an item performs when started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProvisionTarget {
    DownloadMpack { name: String, url: String },
    VerifyRepo(RepoCheck),
}

/// Displayable failure of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// One tracked unit of provisioning work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionItem {
    pub id: String,
    pub target: ProvisionTarget,
    pub state: ProvisionState,
    /// Incremented on every start; settlements from older generations are stale
    pub generation: u64,
    pub failure: Option<ProvisionFailure>,
    /// Id of the server resource created by a download, when reported
    pub resource_id: Option<String>,
}

impl ProvisionItem {
    fn new(id: String, target: ProvisionTarget) -> Self {
        Self {
            id,
            target,
            state: ProvisionState::Pending,
            generation: 0,
            failure: None,
            resource_id: None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.message.as_str())
    }
}

/// Handle identifying one started attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub id: String,
    pub generation: u64,
}

type Outcome = std::result::Result<Option<String>, TransportError>;

#[derive(Debug)]
struct Settlement {
    id: String,
    generation: u64,
    outcome: Outcome,
}

/// Classify a transport failure into the item's next state.
///
/// Returns `None` for outcomes that count as success.
fn classify(error: &TransportError) -> Option<ProvisionFailure> {
    match error.status {
        Some(409) => None,
        Some(400) => Some(ProvisionFailure {
            kind: FailureKind::ClientError,
            message: error.status_text.clone(),
        }),
        Some(500) => Some(ProvisionFailure {
            kind: FailureKind::ServerError,
            message: error.status_text.clone(),
        }),
        _ => Some(ProvisionFailure {
            kind: FailureKind::Generic,
            message: DEFAULT_FAILURE_MESSAGE.to_string(),
        }),
    }
}

/// Per-step owner of provisioning items.
///
/// Must be used from within a Tokio runtime: `start` spawns tasks.
pub struct ProvisioningOrchestrator {
    transport: Arc<dyn Transport>,
    items: Vec<ProvisionItem>,
    errors: Vec<String>,
    tx: mpsc::UnboundedSender<Settlement>,
    rx: mpsc::UnboundedReceiver<Settlement>,
}

impl std::fmt::Debug for ProvisioningOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningOrchestrator")
            .field("items", &self.items)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl ProvisioningOrchestrator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            transport,
            items: Vec::new(),
            errors: Vec::new(),
            tx,
            rx,
        }
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    /// Track a new item in `Pending` without starting it.
    pub fn track(&mut self, id: impl Into<String>, target: ProvisionTarget) -> Result<(), ProvisionTransitionError> {
        let id = id.into();
        if self.get(&id).is_some() {
            return Err(ProvisionTransitionError::DuplicateItem(id));
        }
        self.items.push(ProvisionItem::new(id, target));
        Ok(())
    }

    /// Track and start every target in one pass.
    ///
    /// Items are dispatched in order but settle in any order.
    pub fn launch<I>(&mut self, targets: I) -> Result<Vec<Ticket>, ProvisionTransitionError>
    where
        I: IntoIterator<Item = (String, ProvisionTarget)>,
    {
        let mut tickets = Vec::new();
        for (id, target) in targets {
            self.track(id.clone(), target)?;
            tickets.push(self.start(&id)?);
        }
        Ok(tickets)
    }

    pub fn items(&self) -> &[ProvisionItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&ProvisionItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn index_of(&self, id: &str) -> Result<usize, ProvisionTransitionError> {
        self.items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| ProvisionTransitionError::UnknownItem(id.to_string()))
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Move an item to `InProgress` and dispatch its operation.
    ///
    /// Allowed from `Pending` and `Failed`.
    pub fn start(&mut self, id: &str) -> Result<Ticket, ProvisionTransitionError> {
        let idx = self.index_of(id)?;
        let item = &mut self.items[idx];
        match item.state {
            ProvisionState::Succeeded => {
                return Err(ProvisionTransitionError::AlreadySucceeded(item.id.clone()));
            }
            ProvisionState::InProgress => {
                return Err(ProvisionTransitionError::AlreadyInProgress(item.id.clone()));
            }
            ProvisionState::Pending | ProvisionState::Failed => {}
        }

        item.state = ProvisionState::InProgress;
        item.generation += 1;
        item.failure = None;
        item.resource_id = None;
        tracing::info!("Provisioning {} started (generation {})", item.id, item.generation);

        let ticket = Ticket {
            id: item.id.clone(),
            generation: item.generation,
        };
        let operation = self.dispatch(&self.items[idx].target);
        let tx = self.tx.clone();
        let settlement_ticket = ticket.clone();
        tokio::spawn(async move {
            let outcome = operation.await;
            // Receiver gone means the owning step was left; nothing to update.
            let _ = tx.send(Settlement {
                id: settlement_ticket.id,
                generation: settlement_ticket.generation,
                outcome,
            });
        });

        Ok(ticket)
    }

    /// Restart a failed item.
    pub fn retry(&mut self, id: &str) -> Result<Ticket, ProvisionTransitionError> {
        let idx = self.index_of(id)?;
        let item = &self.items[idx];
        if item.state != ProvisionState::Failed {
            return Err(ProvisionTransitionError::InvalidRetry {
                id: item.id.clone(),
                state: item.state,
            });
        }
        tracing::info!("Retrying {}", item.id);
        self.start(id)
    }

    fn dispatch(&self, target: &ProvisionTarget) -> BoxFuture<'static, Outcome> {
        match target {
            ProvisionTarget::DownloadMpack { name, url } => self
                .transport
                .download_mpack(name, url)
                .map(|r| r.map(|resource| resource.resource_id))
                .boxed(),
            ProvisionTarget::VerifyRepo(check) => self
                .transport
                .verify_repo(check)
                .map(|r| r.map(|()| None))
                .boxed(),
        }
    }

    /// Apply a settlement; returns false when it was stale.
    fn apply(&mut self, settlement: Settlement) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| i.id == settlement.id) else {
            tracing::debug!("Discarding settlement for unknown item {}", settlement.id);
            return false;
        };
        if item.generation != settlement.generation || item.state != ProvisionState::InProgress {
            tracing::debug!(
                "Discarding stale settlement for {} (generation {}, current {})",
                item.id,
                settlement.generation,
                item.generation
            );
            return false;
        }

        match settlement.outcome {
            Ok(resource_id) => {
                item.state = ProvisionState::Succeeded;
                item.resource_id = resource_id;
                tracing::info!("Provisioning {} succeeded", item.id);
            }
            Err(error) => match classify(&error) {
                None => {
                    item.state = ProvisionState::Succeeded;
                    tracing::info!("Provisioning {} already done on the server: {}", item.id, error);
                }
                Some(failure) => {
                    tracing::warn!("Provisioning {} failed: {}", item.id, error);
                    item.state = ProvisionState::Failed;
                    item.failure = Some(failure);
                }
            },
        }
        true
    }

    // ------------------------------------------------------------------
    // Settling
    // ------------------------------------------------------------------

    fn has_in_flight(&self) -> bool {
        self.items.iter().any(|i| i.state == ProvisionState::InProgress)
    }

    /// Wait for the next item to settle and return its id.
    ///
    /// Returns `None` right away when nothing is in flight.
    pub async fn next_settled(&mut self) -> Option<String> {
        while self.has_in_flight() {
            let settlement = self.rx.recv().await?;
            let id = settlement.id.clone();
            if self.apply(settlement) {
                return Some(id);
            }
        }
        None
    }

    /// Apply every settlement that already arrived, without waiting.
    pub fn poll_settled(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(settlement) = self.rx.try_recv() {
            if self.apply(settlement) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait until nothing is in flight.
    pub async fn settle_all(&mut self) {
        while self.next_settled().await.is_some() {}
    }

    /// Wait for the attempt behind `ticket` to settle.
    ///
    /// Returns the item, or `None` if the ticket was superseded or the
    /// item is unknown.
    pub async fn wait_for(&mut self, ticket: &Ticket) -> Option<&ProvisionItem> {
        loop {
            let item = self.get(&ticket.id)?;
            if item.generation != ticket.generation {
                return None;
            }
            if item.state.is_settled() {
                break;
            }
            self.next_settled().await?;
        }
        self.get(&ticket.id)
    }

    // ------------------------------------------------------------------
    // Gate
    // ------------------------------------------------------------------

    /// Record an error that blocks the step regardless of item states
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn failed_items(&self) -> impl Iterator<Item = &ProvisionItem> {
        self.items.iter().filter(|i| i.state == ProvisionState::Failed)
    }

    /// True when every item succeeded and no error is recorded
    pub fn can_advance(&self) -> bool {
        self.errors.is_empty() && self.items.iter().all(|i| i.state == ProvisionState::Succeeded)
    }
}

#[cfg(test)]
mod tests;
