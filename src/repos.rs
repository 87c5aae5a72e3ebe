//! Repository matrix builder
//!
//! Derives the operating system x repository matrix for every selected mpack
//! version. The matrix is rebuilt from scratch whenever a step loads; the
//! only state that survives a rebuild is what the flattened
//! [`MpackRecord`]s carry (download URLs and OS selection), matched by
//! `(mpack, version, os, repo_id)`.
//!
//! # Design
//!
//! - [`RepositoryMatrixBuilder::build`] is pure: the catalog is fetched
//!   beforehand into a [`CatalogSnapshot`] by [`load_catalog`], so building
//!   twice against the same snapshot yields the same output.
//! - Repo ids are derived (`{mpack}-{version}-{os}-{repo_id}`) so two builds
//!   produce comparable identities without an identity map.
//! - `is_first`/`is_last` are positional and recomputed on every build.

use std::collections::HashMap;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::registry::{OsTemplate, RegistrySource, RepoTemplate};
use crate::selection::{mpack_version_id, MpackVersion, SelectionGraphStore};
use crate::types::ProvisionState;

/// Build the globally unique id of a repo entry
pub fn repo_uid(mpack_name: &str, mpack_version: &str, os_type: &str, repo_id: &str) -> String {
    format!("{mpack_name}-{mpack_version}-{os_type}-{repo_id}")
}

// ============================================================================
// Matrix entities
// ============================================================================

/// One package repository of one OS of one mpack version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repo {
    /// `{mpack}-{version}-{os}-{repo_id}`
    pub id: String,
    /// Server-facing id, not unique across mpacks
    pub repo_id: String,
    pub repo_name: String,
    /// Catalog mirror, read-only
    pub public_url: String,
    /// User-editable and authoritative
    pub download_url: String,
    pub unique: bool,
    pub is_first: bool,
    pub is_last: bool,
    pub status: ProvisionState,
    pub failure_message: Option<String>,
}

impl Repo {
    pub fn in_progress(&self) -> bool {
        self.status == ProvisionState::InProgress
    }

    pub fn succeeded(&self) -> bool {
        self.status == ProvisionState::Succeeded
    }

    pub fn failed(&self) -> bool {
        self.status == ProvisionState::Failed
    }

    /// Set the download URL, trimmed
    pub fn set_download_url(&mut self, url: &str) {
        self.download_url = url.trim().to_string();
    }

    /// Restore the catalog URL
    pub fn reset_download_url(&mut self) {
        self.download_url = self.public_url.clone();
    }

    /// Why the download URL is unusable, if it is
    pub fn url_error(&self) -> Option<String> {
        if self.download_url.is_empty() {
            return Some(format!("Repository {} has no URL", self.repo_id));
        }
        match url::Url::parse(&self.download_url) {
            Ok(_) => None,
            Err(e) => Some(format!("Invalid URL for {}: {e}", self.repo_id)),
        }
    }
}

/// An operating system with the repos of one mpack version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatingSystem {
    pub os_type: String,
    pub selected: bool,
    pub repos: Vec<Repo>,
}

/// Repository matrix of one selected mpack version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MpackRepos {
    pub name: String,
    pub version: String,
    pub mpack_version_id: String,
    pub operating_systems: Vec<OperatingSystem>,
}

impl MpackRepos {
    pub fn repos(&self) -> impl Iterator<Item = &Repo> {
        self.operating_systems.iter().flat_map(|os| os.repos.iter())
    }

    pub fn repos_mut(&mut self) -> impl Iterator<Item = &mut Repo> {
        self.operating_systems.iter_mut().flat_map(|os| os.repos.iter_mut())
    }

    /// Repos of the selected operating systems only
    pub fn selected_repos(&self) -> impl Iterator<Item = &Repo> {
        self.operating_systems
            .iter()
            .filter(|os| os.selected)
            .flat_map(|os| os.repos.iter())
    }

    pub fn find_repo_mut(&mut self, id: &str) -> Option<&mut Repo> {
        self.repos_mut().find(|r| r.id == id)
    }

    pub fn set_os_selected(&mut self, os_type: &str, selected: bool) -> bool {
        match self.operating_systems.iter_mut().find(|os| os.os_type == os_type) {
            Some(os) => {
                os.selected = selected;
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Flattened records
// ============================================================================

/// Persisted form of a repo: URL fields only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRecord {
    pub repo_id: String,
    pub repo_name: String,
    pub public_url: String,
    pub download_url: String,
}

/// Persisted form of an operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsRecord {
    pub os_type: String,
    pub selected: bool,
    #[serde(default)]
    pub repos: Vec<RepoRecord>,
}

/// Persisted form of one selected mpack version.
///
/// `download_url` is the (possibly customized) mpack archive URL;
/// `public_url` is the registry default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpackRecord {
    pub name: String,
    pub display_name: String,
    pub version: String,
    pub public_url: String,
    pub download_url: String,
    #[serde(default)]
    pub operating_systems: Vec<OsRecord>,
}

impl MpackRecord {
    /// Record for a freshly selected version, without repo customizations
    pub fn from_version(version: &MpackVersion, display_name: &str) -> Self {
        Self {
            name: version.mpack_name.clone(),
            display_name: display_name.to_string(),
            version: version.version.clone(),
            public_url: version.mpack_url.clone(),
            download_url: version.mpack_url.clone(),
            operating_systems: Vec::new(),
        }
    }

    pub fn is_same_version(&self, name: &str, version: &str) -> bool {
        self.name == name && self.version == version
    }

    /// Replace the OS/repo part of the record with the state of a matrix
    pub fn store_repos(&mut self, matrix: &MpackRepos) {
        self.operating_systems = matrix
            .operating_systems
            .iter()
            .map(|os| OsRecord {
                os_type: os.os_type.clone(),
                selected: os.selected,
                repos: os
                    .repos
                    .iter()
                    .map(|r| RepoRecord {
                        repo_id: r.repo_id.clone(),
                        repo_name: r.repo_name.clone(),
                        public_url: r.public_url.clone(),
                        download_url: r.download_url.clone(),
                    })
                    .collect(),
            })
            .collect();
    }
}

// ============================================================================
// Catalog snapshot
// ============================================================================

/// OS/repo templates fetched for a set of mpack versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    entries: HashMap<(String, String), Vec<OsTemplate>>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mpack_name: &str, version: &str, templates: Vec<OsTemplate>) {
        self.entries
            .insert((mpack_name.to_string(), version.to_string()), templates);
    }

    pub fn get(&self, mpack_name: &str, version: &str) -> Option<&[OsTemplate]> {
        self.entries
            .get(&(mpack_name.to_string(), version.to_string()))
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetch the catalog of every `(mpack, version)` pair concurrently.
///
/// The mpack name and version double as the stack name and version. Any
/// failed lookup fails the whole load.
pub async fn load_catalog<'a, I>(source: &dyn RegistrySource, versions: I) -> Result<CatalogSnapshot>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let pending: Vec<_> = versions
        .into_iter()
        .map(|(name, version)| {
            let fut = source.load_repository_catalog(name, version);
            let key = (name.to_string(), version.to_string());
            async move { fut.await.map(|templates| (key, templates)) }
        })
        .collect();

    let mut snapshot = CatalogSnapshot::new();
    for ((name, version), templates) in try_join_all(pending).await? {
        tracing::debug!("Catalog for {} {}: {} OS(es)", name, version, templates.len());
        snapshot.insert(&name, &version, templates);
    }
    Ok(snapshot)
}

// ============================================================================
// Builder
// ============================================================================

/// Builds [`MpackRepos`] from selected versions, prior records and a catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepositoryMatrixBuilder;

impl RepositoryMatrixBuilder {
    /// Build the matrix for the selected `(mpack name, version)` pairs, in
    /// the given order.
    ///
    /// A prior record for the same mpack name and version contributes its
    /// download URLs (matched by OS and repo id) and its OS selection.
    /// Records for versions that are not selected are ignored, which drops
    /// their customizations. Versions without a catalog entry get an empty
    /// OS list.
    pub fn build<'a, I>(selected: I, prior: &[MpackRecord], catalog: &CatalogSnapshot) -> Vec<MpackRepos>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        selected
            .into_iter()
            .map(|(name, version)| {
                let record = prior.iter().find(|r| r.is_same_version(name, version));
                let templates = catalog.get(name, version).unwrap_or_default();
                if templates.is_empty() {
                    tracing::warn!("No repositories in catalog for {} {}", name, version);
                }

                MpackRepos {
                    name: name.to_string(),
                    version: version.to_string(),
                    mpack_version_id: mpack_version_id(name, version),
                    operating_systems: templates
                        .iter()
                        .map(|os| build_os(name, version, os, record))
                        .collect(),
                }
            })
            .collect()
    }

    /// Build the matrix for the versions currently selected in a store
    pub fn build_for_store(store: &SelectionGraphStore, prior: &[MpackRecord], catalog: &CatalogSnapshot) -> Vec<MpackRepos> {
        Self::build(
            store
                .selected_mpack_versions()
                .map(|v| (v.mpack_name.as_str(), v.version.as_str())),
            prior,
            catalog,
        )
    }

    /// Build the matrix for the mpacks persisted in wizard content
    pub fn build_for_records(records: &[MpackRecord], catalog: &CatalogSnapshot) -> Vec<MpackRepos> {
        Self::build(
            records.iter().map(|r| (r.name.as_str(), r.version.as_str())),
            records,
            catalog,
        )
    }
}

fn build_os(mpack: &str, version: &str, template: &OsTemplate, record: Option<&MpackRecord>) -> OperatingSystem {
    let prior_os = record.and_then(|r| {
        r.operating_systems
            .iter()
            .find(|os| os.os_type == template.os_type)
    });
    let last = template.repos.len().saturating_sub(1);

    OperatingSystem {
        os_type: template.os_type.clone(),
        selected: prior_os.map_or(true, |os| os.selected),
        repos: template
            .repos
            .iter()
            .enumerate()
            .map(|(i, repo)| build_repo(mpack, version, &template.os_type, repo, prior_os, i == 0, i == last))
            .collect(),
    }
}

fn build_repo(
    mpack: &str,
    version: &str,
    os_type: &str,
    template: &RepoTemplate,
    prior_os: Option<&OsRecord>,
    is_first: bool,
    is_last: bool,
) -> Repo {
    let download_url = prior_os
        .and_then(|os| os.repos.iter().find(|r| r.repo_id == template.repo_id))
        .map(|r| r.download_url.clone())
        .unwrap_or_else(|| template.base_url.clone());

    Repo {
        id: repo_uid(mpack, version, os_type, &template.repo_id),
        repo_id: template.repo_id.clone(),
        repo_name: template.repo_name.clone(),
        public_url: template.base_url.clone(),
        download_url,
        unique: template.unique,
        is_first,
        is_last,
        status: ProvisionState::Pending,
        failure_message: None,
    }
}
