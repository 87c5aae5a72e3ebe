//! Registry and repository catalog data
//!
//! The registry lists every installable mpack, its versions and the services
//! each version provides, plus the use cases (bundle recommendations) that
//! reference mpacks by name. The repository catalog maps one mpack version
//! to its per-OS package repositories.
//!
//! Both are read through the [`RegistrySource`] collaborator. Loads must be
//! idempotent; a failed load is terminal for the step that requested it and
//! is surfaced to the user instead of being retried here.

mod source;
mod wire;

use std::cmp::Ordering;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ServiceCategory;

pub use source::{FileRegistrySource, StaticRegistrySource};
pub use wire::{parse_catalog, parse_registry, CatalogEntry};

/// A fully parsed registry snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub mpacks: Vec<MpackDefinition>,
    pub use_cases: Vec<UseCaseDefinition>,
}

/// One mpack as published by a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpackDefinition {
    pub name: String,
    pub display_name: String,
    pub registry_id: u64,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub versions: Vec<MpackVersionDefinition>,
}

/// One published version of an mpack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpackVersionDefinition {
    pub version: String,
    pub mpack_url: String,
    pub doc_url: Option<String>,
    pub services: Vec<ServiceDefinition>,
}

/// A service provided by an mpack version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub category: ServiceCategory,
    pub version: String,
}

/// A bundle recommendation referencing mpacks by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCaseDefinition {
    pub name: String,
    pub description: Option<String>,
    pub mpack_names: Vec<String>,
}

/// Static catalog entry for one repository of one OS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTemplate {
    pub repo_id: String,
    pub repo_name: String,
    pub base_url: String,
    pub unique: bool,
}

/// Static catalog entry for one operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsTemplate {
    pub os_type: String,
    pub repos: Vec<RepoTemplate>,
}

/// External source of registry and catalog data.
///
/// Futures are `'static` so callers may spawn them; implementations clone
/// whatever they need out of `self`.
pub trait RegistrySource: Send + Sync {
    /// Load every mpack and use case known to the registry.
    fn load_registry(&self) -> BoxFuture<'static, Result<Registry>>;

    /// Load the OS/repository template for one stack (mpack) version.
    fn load_repository_catalog(
        &self,
        stack_name: &str,
        stack_version: &str,
    ) -> BoxFuture<'static, Result<Vec<OsTemplate>>>;
}

/// Compare two version strings segment by segment.
///
/// Segments are split on `.` and `-`; numeric segments compare as numbers,
/// everything else lexically, and numbers sort before text.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split(['.', '-']);
    let mut right = b.split(['.', '-']);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
