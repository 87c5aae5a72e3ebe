//! Registry and catalog JSON shapes
//!
//! Mirrors the REST resource layout (`RegistryInfo`, `RegistryMpackInfo`,
//! `RegistryMpackVersionInfo`, `RegistryScenarioInfo`) and converts it into
//! the flat definitions used by the rest of the crate.

use serde::{Deserialize, Serialize};

use super::{
    MpackDefinition, MpackVersionDefinition, OsTemplate, Registry, RepoTemplate,
    ServiceDefinition, UseCaseDefinition,
};
use crate::error::Result;
use crate::types::ServiceCategory;

#[derive(Debug, Deserialize)]
struct RegistryResponse {
    #[serde(default)]
    items: Vec<RegistryItem>,
}

#[derive(Debug, Deserialize)]
struct RegistryItem {
    #[serde(rename = "RegistryInfo")]
    info: RegistryInfo,
    #[serde(default)]
    mpacks: Vec<MpackEntry>,
    #[serde(default)]
    scenarios: Vec<ScenarioEntry>,
}

#[derive(Debug, Deserialize)]
struct RegistryInfo {
    registry_id: u64,
}

#[derive(Debug, Deserialize)]
struct MpackEntry {
    #[serde(rename = "RegistryMpackInfo")]
    info: MpackInfo,
    #[serde(default)]
    versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
struct MpackInfo {
    mpack_name: String,
    #[serde(default)]
    mpack_display_name: Option<String>,
    #[serde(default)]
    mpack_description: Option<String>,
    #[serde(default)]
    mpack_logo_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionEntry {
    #[serde(rename = "RegistryMpackVersionInfo")]
    info: VersionInfo,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    mpack_version: String,
    mpack_uri: String,
    #[serde(default)]
    mpack_doc_uri: Option<String>,
    #[serde(default)]
    modules: Vec<Module>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Module {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    version: String,
}

#[derive(Debug, Deserialize)]
struct ScenarioEntry {
    #[serde(rename = "RegistryScenarioInfo")]
    info: ScenarioInfo,
}

#[derive(Debug, Deserialize)]
struct ScenarioInfo {
    scenario_name: String,
    #[serde(default)]
    scenario_description: Option<String>,
    #[serde(default)]
    scenario_mpacks: Vec<NamedRef>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

/// One stack version of the repository catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub stack_name: String,
    pub stack_version: String,
    #[serde(default)]
    pub operating_systems: Vec<CatalogOs>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogOs {
    #[serde(rename = "OperatingSystems")]
    pub info: CatalogOsInfo,
    #[serde(default)]
    pub repositories: Vec<CatalogRepo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogOsInfo {
    pub os_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRepo {
    #[serde(rename = "Repositories")]
    pub info: CatalogRepoInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRepoInfo {
    pub repo_id: String,
    pub repo_name: String,
    pub base_url: String,
    #[serde(default)]
    pub unique: bool,
}

impl CatalogEntry {
    /// Flatten into the OS templates consumed by the matrix builder
    pub fn templates(&self) -> Vec<OsTemplate> {
        self.operating_systems
            .iter()
            .map(|os| OsTemplate {
                os_type: os.info.os_type.clone(),
                repos: os
                    .repositories
                    .iter()
                    .map(|r| RepoTemplate {
                        repo_id: r.info.repo_id.clone(),
                        repo_name: r.info.repo_name.clone(),
                        base_url: r.info.base_url.clone(),
                        unique: r.info.unique,
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Parse a registry response body.
///
/// Mpacks of every registry in the response are merged; use cases keep the
/// order in which registries list them.
pub fn parse_registry(json: &str) -> Result<Registry> {
    let response: RegistryResponse = serde_json::from_str(json)?;
    let mut registry = Registry::default();

    for item in response.items {
        let registry_id = item.info.registry_id;
        for mpack in item.mpacks {
            let versions = mpack
                .versions
                .into_iter()
                .map(|v| MpackVersionDefinition {
                    version: v.info.mpack_version,
                    mpack_url: v.info.mpack_uri,
                    doc_url: v.info.mpack_doc_uri,
                    services: v.info.modules.into_iter().map(module_to_service).collect(),
                })
                .collect();

            registry.mpacks.push(MpackDefinition {
                display_name: mpack
                    .info
                    .mpack_display_name
                    .unwrap_or_else(|| mpack.info.mpack_name.clone()),
                name: mpack.info.mpack_name,
                registry_id,
                description: mpack.info.mpack_description,
                logo_url: mpack.info.mpack_logo_uri,
                versions,
            });
        }

        for scenario in item.scenarios {
            registry.use_cases.push(UseCaseDefinition {
                name: scenario.info.scenario_name,
                description: scenario.info.scenario_description,
                mpack_names: scenario
                    .info
                    .scenario_mpacks
                    .into_iter()
                    .map(|m| m.name)
                    .collect(),
            });
        }
    }

    Ok(registry)
}

fn module_to_service(module: Module) -> ServiceDefinition {
    let category = module
        .category
        .as_deref()
        .and_then(|c| c.parse::<ServiceCategory>().ok())
        .unwrap_or_default();
    ServiceDefinition {
        display_name: module.display_name.unwrap_or_else(|| module.name.clone()),
        name: module.name,
        description: module.description,
        category,
        version: module.version,
    }
}

/// Parse a repository catalog file.
pub fn parse_catalog(json: &str) -> Result<Vec<CatalogEntry>> {
    Ok(serde_json::from_str(json)?)
}
