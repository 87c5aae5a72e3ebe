//! Entities of the selection graph
//!
//! Identifiers are immutable. Only `selected` and `displayed` change after a
//! registry load, and only through [`super::SelectionGraphStore`].

use serde::Serialize;

use crate::types::ServiceCategory;

/// An installable bundle of services, one per name per registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mpack {
    pub name: String,
    pub display_name: String,
    pub registry_id: u64,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    /// Ids of the versions owned by this mpack, registry order
    pub version_ids: Vec<String>,
}

/// One version of an mpack, owned exclusively by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MpackVersion {
    /// `mpack_name + version`
    pub id: String,
    pub mpack_name: String,
    pub version: String,
    pub mpack_url: String,
    pub doc_url: Option<String>,
    pub service_ids: Vec<String>,
    pub selected: bool,
    /// UI focus only; not a selection
    pub displayed: bool,
}

/// A service as provided by one specific mpack version.
///
/// The same logical service (e.g. `HDFS`) offered by two mpack versions is
/// two distinct entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceVersion {
    /// `mpack_name + mpack_version + name`
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub category: ServiceCategory,
    pub version: String,
    pub mpack_version_id: String,
    pub selected: bool,
    pub displayed: bool,
}

/// User-named container binding a name to exactly one mpack version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceGroup {
    pub name: String,
    pub mpack_version_id: String,
    /// False for groups that already exist in the cluster
    pub can_remove: bool,
}

/// A named, deployable occurrence of a service within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInstance {
    pub name: String,
    pub service_id: String,
    pub group_name: String,
    pub can_remove: bool,
}

/// A registry bundle recommendation, referencing mpacks by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UseCase {
    pub id: String,
    pub description: Option<String>,
    pub mpack_names: Vec<String>,
    pub selected: bool,
}
