//! Mpack and service selection step
//!
//! The handlers here are the cascade layer on top of
//! [`SelectionGraphStore`]: the store never removes a group just because its
//! last instance went away, so every handler that can empty a group checks
//! and removes it explicitly, deselecting the mpack version with it.
//!
//! Default naming: a group is named after its mpack and an instance after
//! its service.

use std::collections::HashSet;

use crate::error::Result;
use crate::registry::Registry;
use crate::repos::MpackRecord;
use crate::selection::SelectionGraphStore;
use crate::types::SelectionMode;
use crate::wizard::{GroupRecord, InstanceRecord, WizardContent, WizardStep, WizardStepId};

/// Selection of mpacks, services and use cases.
#[derive(Debug, Clone)]
pub struct SelectMpacksStep {
    registry: Registry,
    store: SelectionGraphStore,
    prior_records: Vec<MpackRecord>,
    edited: bool,
}

impl SelectMpacksStep {
    pub fn new(registry: Registry) -> Self {
        let store = SelectionGraphStore::from_registry(&registry);
        Self {
            registry,
            store,
            prior_records: Vec::new(),
            edited: false,
        }
    }

    pub fn store(&self) -> &SelectionGraphStore {
        &self.store
    }

    // ------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------

    /// Select a whole mpack version: its default group with one instance
    /// per service. Switches to manual selection.
    pub fn add_mpack_handler(&mut self, mpack_version_id: &str) -> bool {
        if self.store.get_mpack_version_by_id(mpack_version_id).is_none() {
            return false;
        }
        self.store.set_mode(SelectionMode::Manual);
        let added = self.select_whole_version(mpack_version_id);
        self.edited |= added;
        added
    }

    /// Add one service to the default group of its mpack version.
    pub fn add_service_handler(&mut self, service_id: &str) -> bool {
        let Some((version_id, mpack_name, service_name)) = self.service_names(service_id) else {
            return false;
        };
        self.store.set_mode(SelectionMode::Manual);
        if !self.ensure_default_group(&version_id, &mpack_name) {
            return false;
        }
        let added = self
            .store
            .add_service_instance(service_id, &service_name, &mpack_name)
            .is_some();
        self.edited |= added;
        added
    }

    /// Remove a service from the default group; an emptied group takes the
    /// mpack version with it.
    pub fn remove_service_handler(&mut self, service_id: &str) -> bool {
        let Some((version_id, mpack_name, service_name)) = self.service_names(service_id) else {
            return false;
        };
        if !self.is_default_group_of(&mpack_name, &version_id) {
            return false;
        }
        let removed = self.store.remove_service_instance(&service_name, &mpack_name);
        if !self.service_in_use(service_id) {
            self.store.remove_service_version(service_id);
        }
        if removed && self.store.instances_of(&mpack_name).next().is_none() {
            self.remove_mpack_handler(&version_id);
        }
        self.edited |= removed;
        removed
    }

    /// Drop the default group of an mpack version and deselect it.
    pub fn remove_mpack_handler(&mut self, mpack_version_id: &str) -> bool {
        let Some(version) = self.store.get_mpack_version_by_id(mpack_version_id) else {
            return false;
        };
        let mpack_name = version.mpack_name.clone();
        if self.is_default_group_of(&mpack_name, mpack_version_id) {
            self.store.remove_service_group(&mpack_name);
        }
        let removed = self.store.remove_mpack_version(mpack_version_id).is_some();
        self.edited |= removed;
        removed
    }

    pub fn remove_service_group_handler(&mut self, name: &str) -> bool {
        let removed = self.store.remove_service_group(name);
        self.edited |= removed;
        removed
    }

    /// Remove one instance; the service is deselected once unused and an
    /// emptied group is removed.
    pub fn remove_service_instance_handler(&mut self, group_name: &str, instance_name: &str) -> bool {
        let Some(service_id) = self
            .store
            .get_service_instance(group_name, instance_name)
            .map(|i| i.service_id.clone())
        else {
            return false;
        };
        if !self.store.remove_service_instance(instance_name, group_name) {
            return false;
        }
        if !self.service_in_use(&service_id) {
            self.store.remove_service_version(&service_id);
        }
        if self.store.instances_of(group_name).next().is_none() {
            self.store.remove_service_group(group_name);
        }
        self.edited = true;
        true
    }

    /// Toggle a use case and rebuild the selection from every selected use
    /// case, using the newest version of each referenced mpack.
    pub fn toggle_use_case_handler(&mut self, id: &str) -> Option<bool> {
        let selected = self.store.toggle_use_case(id)?;
        self.derive_use_case_selection();
        self.edited = true;
        Some(selected)
    }

    pub fn clear_selection_handler(&mut self) {
        self.store.clear_selection();
        self.edited = true;
    }

    pub fn display_mpack_version(&mut self, id: &str) -> bool {
        self.store.display_mpack_version(id).is_some()
    }

    pub fn display_service_version(&mut self, id: &str) -> bool {
        self.store.display_service_version(id).is_some()
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// `(mpack version id, mpack name, service name)` of a service
    fn service_names(&self, service_id: &str) -> Option<(String, String, String)> {
        let service = self.store.get_service_version_by_id(service_id)?;
        let version = self.store.mpack_version_of(service)?;
        Some((version.id.clone(), version.mpack_name.clone(), service.name.clone()))
    }

    fn is_default_group_of(&self, mpack_name: &str, version_id: &str) -> bool {
        self.store
            .get_service_group(mpack_name)
            .is_some_and(|g| g.mpack_version_id == version_id)
    }

    fn service_in_use(&self, service_id: &str) -> bool {
        self.store
            .service_instances()
            .iter()
            .any(|i| i.service_id == service_id)
    }

    /// Make sure the group named after the mpack exists and is bound to
    /// `version_id`. Fails if the name belongs to another version.
    fn ensure_default_group(&mut self, version_id: &str, mpack_name: &str) -> bool {
        match self.store.get_service_group(mpack_name) {
            Some(group) if group.mpack_version_id == version_id => true,
            Some(group) => {
                tracing::debug!(
                    "Group {} is bound to {}, not {}",
                    mpack_name,
                    group.mpack_version_id,
                    version_id
                );
                false
            }
            None => self.store.add_service_group(version_id, mpack_name).is_some(),
        }
    }

    fn select_whole_version(&mut self, version_id: &str) -> bool {
        let Some(version) = self.store.get_mpack_version_by_id(version_id) else {
            return false;
        };
        let mpack_name = version.mpack_name.clone();
        let services: Vec<(String, String)> = self
            .store
            .services_of(version)
            .map(|s| (s.id.clone(), s.name.clone()))
            .collect();

        if !self.ensure_default_group(version_id, &mpack_name) {
            return false;
        }
        self.store.add_mpack_version(version_id);
        for (service_id, service_name) in services {
            self.store.add_service_instance(&service_id, &service_name, &mpack_name);
        }
        true
    }

    fn derive_use_case_selection(&mut self) {
        let mut seen = HashSet::new();
        let mpack_names: Vec<String> = self
            .store
            .selected_use_cases()
            .flat_map(|uc| uc.mpack_names.iter().cloned())
            .filter(|name| seen.insert(name.clone()))
            .collect();

        for name in mpack_names {
            let Some(version_id) = self.store.newest_version(&name).map(|v| v.id.clone()) else {
                tracing::warn!("Use case references unknown mpack {}", name);
                continue;
            };
            self.select_whole_version(&version_id);
        }
    }

    fn restore_groups(&mut self, groups: &[GroupRecord], instances: &[InstanceRecord], existing: bool) {
        for group in groups {
            let version_id = group.mpack_version_id();
            let created = if existing {
                self.store.register_existing_group(&version_id, &group.name).is_some()
            } else {
                self.store.add_service_group(&version_id, &group.name).is_some()
            };
            if !created {
                tracing::warn!("Could not restore service group {}", group.name);
                continue;
            }
            self.store.add_mpack_version(&version_id);
        }

        for instance in instances {
            let Some(group) = groups.iter().find(|g| g.name == instance.group_name) else {
                continue;
            };
            let service_id = instance.service_id(group);
            let restored = if existing {
                self.store
                    .register_existing_instance(&service_id, &instance.name, &group.name)
                    .is_some()
            } else {
                self.store
                    .add_service_instance(&service_id, &instance.name, &group.name)
                    .is_some()
            };
            if !restored {
                tracing::warn!("Could not restore service instance {}/{}", group.name, instance.name);
            }
        }
    }
}

impl WizardStep for SelectMpacksStep {
    fn id(&self) -> WizardStepId {
        WizardStepId::SelectMpacks
    }

    fn load(&mut self, content: &WizardContent) -> Result<()> {
        self.store.load_registry(&self.registry);
        self.restore_groups(
            &content.existing_service_groups,
            &content.existing_service_instances,
            true,
        );

        // Use cases restore their flags only; groups and instances come
        // from the saved records.
        if content.selection_mode == SelectionMode::UseCaseDriven {
            for id in &content.selected_use_cases {
                self.store.toggle_use_case(id);
            }
        }
        self.restore_groups(
            &content.added_service_groups,
            &content.added_service_instances,
            false,
        );

        self.prior_records = content.selected_mpacks.clone();
        self.edited = false;
        Ok(())
    }

    fn can_advance(&self) -> bool {
        self.store.service_instances().iter().any(|i| i.can_remove)
    }

    fn save(&self, content: &mut WizardContent) {
        content.selection_mode = self.store.mode();
        content.selected_use_cases = self
            .store
            .selected_use_cases()
            .map(|uc| uc.id.clone())
            .collect();

        // Records of versions that stay selected keep their customizations.
        content.selected_mpacks = self
            .store
            .selected_mpack_versions()
            .map(|version| {
                self.prior_records
                    .iter()
                    .find(|r| r.is_same_version(&version.mpack_name, &version.version))
                    .cloned()
                    .unwrap_or_else(|| {
                        let display_name = self
                            .store
                            .get_mpack(&version.mpack_name)
                            .map_or(version.mpack_name.as_str(), |m| m.display_name.as_str());
                        MpackRecord::from_version(version, display_name)
                    })
            })
            .collect();

        let added: Vec<GroupRecord> = self
            .store
            .added_service_groups()
            .filter_map(|group| {
                let version = self.store.get_mpack_version_by_id(&group.mpack_version_id)?;
                Some(GroupRecord {
                    name: group.name.clone(),
                    mpack_name: version.mpack_name.clone(),
                    mpack_version: version.version.clone(),
                })
            })
            .collect();
        content.added_service_instances = self
            .store
            .service_instances()
            .iter()
            .filter(|i| i.can_remove)
            .filter_map(|i| {
                let service = self.store.get_service_version_by_id(&i.service_id)?;
                Some(InstanceRecord {
                    name: i.name.clone(),
                    group_name: i.group_name.clone(),
                    service_name: service.name.clone(),
                })
            })
            .collect();
        content.added_service_groups = added;
    }

    fn take_edited(&mut self) -> bool {
        std::mem::take(&mut self.edited)
    }
}
