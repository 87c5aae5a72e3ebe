//! mpack-wizard library
//!
//! Selection-and-provisioning core of a cluster installation wizard:
//!
//! - [`hosts`] expands host specifications like `node[01-03].example.com`
//! - [`selection`] owns the graph of mpacks, services, groups and instances
//! - [`repos`] derives the OS x repository matrix of the selection
//! - [`provision`] runs retryable per-item downloads and verifications
//! - [`wizard`] sequences the steps over persisted content

pub mod cli;
pub mod config;
pub mod error;
pub mod hosts;
pub mod provision;
pub mod registry;
pub mod repos;
pub mod selection;
pub mod types;
pub mod wizard;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export main types for convenience
pub use config::WizardConfig;
pub use error::{Result, WizardError};
pub use hosts::{evaluate_host_input, expand, validate_host_name, HostExpansion, HostInputReport};
pub use provision::{
    HttpTransport, ProvisionItem, ProvisionTarget, ProvisionTransitionError, ProvisioningOrchestrator,
    Transport, TransportError,
};
pub use registry::{FileRegistrySource, Registry, RegistrySource, StaticRegistrySource};
pub use repos::{CatalogSnapshot, MpackRecord, MpackRepos, Repo, RepositoryMatrixBuilder};
pub use selection::SelectionGraphStore;
pub use types::{FailureKind, ProvisionState, SelectionMode, ServiceCategory};
pub use wizard::{ContentStore, WizardContent, WizardStep, WizardStepGate, WizardStepId};
