//! Type-safe enums shared across the wizard core
//!
//! Stringly-typed flags from the persisted content and the registry are
//! parsed into these enums at the boundary so the rest of the crate can
//! match exhaustively.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How the current selection was produced.
///
/// Use-case recommendations and manual picks are mutually exclusive: moving
/// from one variant to the other clears the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    Manual,
    UseCaseDriven,
}

/// Lifecycle of a single provisioning item.
///
/// ```text
/// Pending -> InProgress -> Succeeded
///                  |
///                  v
///               Failed --retry--> InProgress
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProvisionState {
    #[default]
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl ProvisionState {
    /// True once the item reached a state it will not leave on its own
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Displayable category of a provisioning failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// HTTP 400: the request itself was rejected
    ClientError,
    /// HTTP 500: the server failed while handling it
    ServerError,
    /// Anything else, including network errors without a status
    Generic,
}

/// Category of a registry module (service).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ServiceCategory {
    #[default]
    Server,
    Client,
}
