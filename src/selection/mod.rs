//! Selection graph store
//!
//! In-memory graph of mpacks, their versions and the services each version
//! provides, overlaid with the service groups and service instances the user
//! chose. The store is the single owner of this graph: callers receive shared
//! references only and change the graph through the mutators below, so the
//! referential invariants are enforced in one place.
//!
//! # Invariants
//!
//! - A service instance exists only while its group exists and the mpack
//!   version of its service is selected.
//! - Selecting a service selects its mpack version; deselecting an mpack
//!   version deselects all of its services.
//! - Group names are unique among all groups (existing and added); instance
//!   names are unique within a group.
//! - Groups and instances that already exist in the cluster
//!   (`can_remove == false`) are never removed and keep their services
//!   selected.
//!
//! Duplicate names and unknown ids are rejected silently: the mutator
//! returns `None`/`false` and leaves the graph unchanged. Callers that need
//! to tell "already exists" from "created" query first.
//!
//! Removing the last instance of a group does **not** remove the group here.
//! The step handlers in [`crate::wizard::steps::select_mpacks`] own that
//! cascade so bulk edits never trigger surprising removals.

mod entities;

use std::collections::HashMap;

use crate::registry::{compare_versions, Registry};
use crate::types::SelectionMode;

pub use entities::{Mpack, MpackVersion, ServiceGroup, ServiceInstance, ServiceVersion, UseCase};

/// Build the id of an mpack version (`name + version`)
pub fn mpack_version_id(mpack_name: &str, version: &str) -> String {
    format!("{mpack_name}{version}")
}

/// Build the id of a service version (`mpackName + mpackVersion + serviceName`)
pub fn service_version_id(mpack_name: &str, version: &str, service_name: &str) -> String {
    format!("{mpack_name}{version}{service_name}")
}

/// Owned selection graph with an explicit mutation API.
#[derive(Debug, Clone, Default)]
pub struct SelectionGraphStore {
    mpacks: Vec<Mpack>,
    mpack_versions: Vec<MpackVersion>,
    services: Vec<ServiceVersion>,
    use_cases: Vec<UseCase>,
    mpack_version_index: HashMap<String, usize>,
    service_index: HashMap<String, usize>,
    /// Existing groups first, then groups added in this wizard run
    groups: Vec<ServiceGroup>,
    instances: Vec<ServiceInstance>,
    mode: SelectionMode,
    loaded: bool,
}

impl SelectionGraphStore {
    /// Create an empty store; nothing is selectable until a registry loads
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store populated from a registry snapshot
    pub fn from_registry(registry: &Registry) -> Self {
        let mut store = Self::new();
        store.load_registry(registry);
        store
    }

    /// Replace the mpack graph with a fresh registry snapshot.
    ///
    /// All selection state is dropped, including groups and instances.
    pub fn load_registry(&mut self, registry: &Registry) {
        *self = Self::default();

        for def in &registry.mpacks {
            let mut version_ids = Vec::with_capacity(def.versions.len());
            for version in &def.versions {
                let id = mpack_version_id(&def.name, &version.version);
                let mut service_ids = Vec::with_capacity(version.services.len());
                for service in &version.services {
                    let service_id = service_version_id(&def.name, &version.version, &service.name);
                    self.service_index.insert(service_id.clone(), self.services.len());
                    self.services.push(ServiceVersion {
                        id: service_id.clone(),
                        name: service.name.clone(),
                        display_name: service.display_name.clone(),
                        description: service.description.clone(),
                        category: service.category,
                        version: service.version.clone(),
                        mpack_version_id: id.clone(),
                        selected: false,
                        displayed: false,
                    });
                    service_ids.push(service_id);
                }

                self.mpack_version_index.insert(id.clone(), self.mpack_versions.len());
                self.mpack_versions.push(MpackVersion {
                    id: id.clone(),
                    mpack_name: def.name.clone(),
                    version: version.version.clone(),
                    mpack_url: version.mpack_url.clone(),
                    doc_url: version.doc_url.clone(),
                    service_ids,
                    selected: false,
                    displayed: false,
                });
                version_ids.push(id);
            }

            self.mpacks.push(Mpack {
                name: def.name.clone(),
                display_name: def.display_name.clone(),
                registry_id: def.registry_id,
                description: def.description.clone(),
                logo_url: def.logo_url.clone(),
                version_ids,
            });
        }

        self.use_cases = registry
            .use_cases
            .iter()
            .map(|uc| UseCase {
                id: uc.name.clone(),
                description: uc.description.clone(),
                mpack_names: uc.mpack_names.clone(),
                selected: false,
            })
            .collect();

        self.loaded = true;
        tracing::debug!(
            "Selection graph loaded: {} mpack(s), {} version(s), {} service(s)",
            self.mpacks.len(),
            self.mpack_versions.len(),
            self.services.len()
        );
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether a registry has been loaded into the store
    pub fn registry_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn mpacks(&self) -> &[Mpack] {
        &self.mpacks
    }

    pub fn mpack_versions(&self) -> &[MpackVersion] {
        &self.mpack_versions
    }

    pub fn use_cases(&self) -> &[UseCase] {
        &self.use_cases
    }

    pub fn get_mpack(&self, name: &str) -> Option<&Mpack> {
        self.mpacks.iter().find(|m| m.name == name)
    }

    pub fn get_mpack_version_by_id(&self, id: &str) -> Option<&MpackVersion> {
        self.mpack_version_index.get(id).map(|&i| &self.mpack_versions[i])
    }

    pub fn get_service_version_by_id(&self, id: &str) -> Option<&ServiceVersion> {
        self.service_index.get(id).map(|&i| &self.services[i])
    }

    pub fn get_use_case(&self, id: &str) -> Option<&UseCase> {
        self.use_cases.iter().find(|uc| uc.id == id)
    }

    pub fn get_service_group(&self, name: &str) -> Option<&ServiceGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Versions of one mpack, in registry order
    pub fn versions_of<'a>(&'a self, mpack: &'a Mpack) -> impl Iterator<Item = &'a MpackVersion> + 'a {
        mpack
            .version_ids
            .iter()
            .filter_map(|id| self.get_mpack_version_by_id(id))
    }

    /// Highest version of the named mpack
    pub fn newest_version(&self, mpack_name: &str) -> Option<&MpackVersion> {
        let mpack = self.get_mpack(mpack_name)?;
        self.versions_of(mpack)
            .max_by(|a, b| compare_versions(&a.version, &b.version))
    }

    /// Services provided by one mpack version
    pub fn services_of<'a>(
        &'a self,
        version: &'a MpackVersion,
    ) -> impl Iterator<Item = &'a ServiceVersion> + 'a {
        version
            .service_ids
            .iter()
            .filter_map(|id| self.get_service_version_by_id(id))
    }

    /// The mpack version that provides `service`
    pub fn mpack_version_of(&self, service: &ServiceVersion) -> Option<&MpackVersion> {
        self.get_mpack_version_by_id(&service.mpack_version_id)
    }

    pub fn selected_mpack_versions(&self) -> impl Iterator<Item = &MpackVersion> {
        self.mpack_versions.iter().filter(|v| v.selected)
    }

    pub fn selected_services(&self) -> impl Iterator<Item = &ServiceVersion> {
        self.services.iter().filter(|s| s.selected)
    }

    pub fn selected_use_cases(&self) -> impl Iterator<Item = &UseCase> {
        self.use_cases.iter().filter(|uc| uc.selected)
    }

    /// All groups, existing ones first
    pub fn service_groups(&self) -> &[ServiceGroup] {
        &self.groups
    }

    /// Groups added during this wizard run
    pub fn added_service_groups(&self) -> impl Iterator<Item = &ServiceGroup> {
        self.groups.iter().filter(|g| g.can_remove)
    }

    pub fn service_instances(&self) -> &[ServiceInstance] {
        &self.instances
    }

    /// Instances that belong to the named group
    pub fn instances_of<'a>(&'a self, group_name: &'a str) -> impl Iterator<Item = &'a ServiceInstance> + 'a {
        self.instances.iter().filter(move |i| i.group_name == group_name)
    }

    pub fn get_service_instance(&self, group_name: &str, instance_name: &str) -> Option<&ServiceInstance> {
        self.instances
            .iter()
            .find(|i| i.group_name == group_name && i.name == instance_name)
    }

    // ------------------------------------------------------------------
    // Mpack and service selection
    // ------------------------------------------------------------------

    /// Mark an mpack version selected.
    pub fn add_mpack_version(&mut self, id: &str) -> Option<&MpackVersion> {
        let idx = *self.mpack_version_index.get(id)?;
        self.mpack_versions[idx].selected = true;
        Some(&self.mpack_versions[idx])
    }

    /// Deselect an mpack version and every service it provides.
    ///
    /// Added groups bound to the version are removed together with their
    /// instances. A version pinned by an existing group stays selected and
    /// the call returns `None`.
    pub fn remove_mpack_version(&mut self, id: &str) -> Option<&MpackVersion> {
        let idx = *self.mpack_version_index.get(id)?;
        if self.is_pinned_version(id) {
            tracing::debug!("Mpack version {} is used by an existing service group", id);
            return None;
        }

        let bound: Vec<String> = self
            .groups
            .iter()
            .filter(|g| g.mpack_version_id == id)
            .map(|g| g.name.clone())
            .collect();
        for name in bound {
            self.drop_group(&name);
        }

        self.deselect_version(idx);
        Some(&self.mpack_versions[idx])
    }

    /// Select a service and, upward, its mpack version.
    pub fn add_service_version(&mut self, id: &str) -> Option<&ServiceVersion> {
        let idx = *self.service_index.get(id)?;
        let version_id = self.services[idx].mpack_version_id.clone();
        self.services[idx].selected = true;
        self.add_mpack_version(&version_id);
        Some(&self.services[idx])
    }

    /// Deselect a service. The mpack version keeps its selection.
    ///
    /// No-op while an existing instance uses the service.
    pub fn remove_service_version(&mut self, id: &str) -> Option<&ServiceVersion> {
        let idx = *self.service_index.get(id)?;
        if self.instances.iter().any(|i| !i.can_remove && i.service_id == id) {
            return None;
        }
        self.services[idx].selected = false;
        Some(&self.services[idx])
    }

    /// Give UI focus to one mpack version; its sibling versions lose it.
    pub fn display_mpack_version(&mut self, id: &str) -> Option<&MpackVersion> {
        let idx = *self.mpack_version_index.get(id)?;
        let mpack_name = self.mpack_versions[idx].mpack_name.clone();
        for version in self.mpack_versions.iter_mut().filter(|v| v.mpack_name == mpack_name) {
            version.displayed = version.id == id;
        }
        Some(&self.mpack_versions[idx])
    }

    /// Give UI focus to one service version; the same service in other
    /// versions loses it.
    pub fn display_service_version(&mut self, id: &str) -> Option<&ServiceVersion> {
        let idx = *self.service_index.get(id)?;
        let name = self.services[idx].name.clone();
        let mpack_name = self
            .mpack_version_of(&self.services[idx])
            .map(|v| v.mpack_name.clone());

        let sibling_versions: Vec<String> = self
            .mpack_versions
            .iter()
            .filter(|v| Some(&v.mpack_name) == mpack_name.as_ref())
            .map(|v| v.id.clone())
            .collect();
        for service in self
            .services
            .iter_mut()
            .filter(|s| s.name == name && sibling_versions.contains(&s.mpack_version_id))
        {
            service.displayed = service.id == id;
        }
        Some(&self.services[idx])
    }

    // ------------------------------------------------------------------
    // Service groups and instances
    // ------------------------------------------------------------------

    /// Add a removable group bound to an mpack version.
    ///
    /// Returns `None` when the name is taken by any group or the version is
    /// unknown.
    pub fn add_service_group(&mut self, mpack_version_id: &str, name: &str) -> Option<&ServiceGroup> {
        self.insert_group(mpack_version_id, name, true)
    }

    /// Record a group that already exists in the cluster.
    ///
    /// Existing groups cannot be removed by this wizard run.
    pub fn register_existing_group(&mut self, mpack_version_id: &str, name: &str) -> Option<&ServiceGroup> {
        self.insert_group(mpack_version_id, name, false)
    }

    fn insert_group(&mut self, mpack_version_id: &str, name: &str, can_remove: bool) -> Option<&ServiceGroup> {
        if !self.mpack_version_index.contains_key(mpack_version_id) {
            return None;
        }
        if self.get_service_group(name).is_some() {
            tracing::debug!("Service group {} already exists", name);
            return None;
        }

        self.groups.push(ServiceGroup {
            name: name.to_string(),
            mpack_version_id: mpack_version_id.to_string(),
            can_remove,
        });
        self.groups.last()
    }

    /// Remove a removable group, its instances first.
    ///
    /// The bound mpack version is deselected once no other group uses it.
    pub fn remove_service_group(&mut self, name: &str) -> bool {
        let Some(group) = self.get_service_group(name) else {
            return false;
        };
        if !group.can_remove {
            return false;
        }
        let version_id = group.mpack_version_id.clone();

        self.drop_group(name);

        let still_bound = self.groups.iter().any(|g| g.mpack_version_id == version_id);
        if !still_bound {
            if let Some(&idx) = self.mpack_version_index.get(&version_id) {
                self.deselect_version(idx);
            }
        }
        true
    }

    /// Add an instance of a service to a group and select the service.
    ///
    /// Returns `None` when the instance name is taken within the group, the
    /// group or service is unknown, or the service does not come from the
    /// mpack version the group is bound to.
    pub fn add_service_instance(
        &mut self,
        service_id: &str,
        instance_name: &str,
        group_name: &str,
    ) -> Option<&ServiceInstance> {
        self.insert_instance(service_id, instance_name, group_name, true)
    }

    /// Record an instance that already exists in the cluster.
    pub fn register_existing_instance(
        &mut self,
        service_id: &str,
        instance_name: &str,
        group_name: &str,
    ) -> Option<&ServiceInstance> {
        self.insert_instance(service_id, instance_name, group_name, false)
    }

    fn insert_instance(
        &mut self,
        service_id: &str,
        instance_name: &str,
        group_name: &str,
        can_remove: bool,
    ) -> Option<&ServiceInstance> {
        let group = self.get_service_group(group_name)?;
        let service = self.get_service_version_by_id(service_id)?;
        if service.mpack_version_id != group.mpack_version_id {
            tracing::debug!(
                "Service {} does not belong to the mpack of group {}",
                service_id,
                group_name
            );
            return None;
        }
        if self.get_service_instance(group_name, instance_name).is_some() {
            tracing::debug!("Service instance {} already exists in {}", instance_name, group_name);
            return None;
        }

        self.add_service_version(service_id);
        self.instances.push(ServiceInstance {
            name: instance_name.to_string(),
            service_id: service_id.to_string(),
            group_name: group_name.to_string(),
            can_remove,
        });
        self.instances.last()
    }

    /// Remove a removable instance from a group.
    ///
    /// Emptying the group does not remove it; see the module docs.
    pub fn remove_service_instance(&mut self, instance_name: &str, group_name: &str) -> bool {
        let Some(pos) = self
            .instances
            .iter()
            .position(|i| i.group_name == group_name && i.name == instance_name)
        else {
            return false;
        };
        if !self.instances[pos].can_remove {
            return false;
        }
        self.instances.remove(pos);
        true
    }

    // ------------------------------------------------------------------
    // Selection modes
    // ------------------------------------------------------------------

    /// Toggle a use case.
    ///
    /// Use-case recommendations and manual selection are exclusive, so every
    /// current selection is cleared before the flag flips. Returns the new
    /// `selected` value.
    pub fn toggle_use_case(&mut self, id: &str) -> Option<bool> {
        let idx = self.use_cases.iter().position(|uc| uc.id == id)?;
        self.clear_manual_selection();
        self.mode = SelectionMode::UseCaseDriven;
        let use_case = &mut self.use_cases[idx];
        use_case.selected = !use_case.selected;
        tracing::debug!("Use case {} selected={}", use_case.id, use_case.selected);
        Some(use_case.selected)
    }

    /// Switch selection mode, clearing the selection when the mode changes.
    ///
    /// Returns true when a switch happened.
    pub fn set_mode(&mut self, mode: SelectionMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.clear_selection();
        self.mode = mode;
        true
    }

    /// Drop every selection the user made.
    ///
    /// In use-case mode the use cases are deselected as well. Existing groups
    /// and instances survive and keep their services selected.
    pub fn clear_selection(&mut self) {
        self.clear_manual_selection();
        if self.mode == SelectionMode::UseCaseDriven {
            for use_case in &mut self.use_cases {
                use_case.selected = false;
            }
        }
    }

    fn clear_manual_selection(&mut self) {
        self.instances.retain(|i| !i.can_remove);
        self.groups.retain(|g| !g.can_remove);
        for version in &mut self.mpack_versions {
            version.selected = false;
        }
        for service in &mut self.services {
            service.selected = false;
        }
        self.pin_existing();
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Re-select the services and versions used by existing instances
    fn pin_existing(&mut self) {
        let pinned: Vec<String> = self
            .instances
            .iter()
            .filter(|i| !i.can_remove)
            .map(|i| i.service_id.clone())
            .collect();
        for service_id in pinned {
            self.add_service_version(&service_id);
        }
    }

    fn is_pinned_version(&self, version_id: &str) -> bool {
        self.groups
            .iter()
            .any(|g| !g.can_remove && g.mpack_version_id == version_id)
    }

    fn drop_group(&mut self, name: &str) {
        self.instances.retain(|i| i.group_name != name);
        self.groups.retain(|g| g.name != name);
    }

    fn deselect_version(&mut self, idx: usize) {
        let version = &mut self.mpack_versions[idx];
        version.selected = false;
        for service_id in &version.service_ids {
            if let Some(&s) = self.service_index.get(service_id) {
                self.services[s].selected = false;
            }
        }
    }
}

#[cfg(test)]
mod tests;
