use super::*;
use crate::fixtures;

fn store() -> SelectionGraphStore {
    SelectionGraphStore::from_registry(&fixtures::registry())
}

#[test]
fn test_registry_loaded() {
    assert!(!SelectionGraphStore::new().registry_loaded());
    assert!(store().registry_loaded());
}

#[test]
fn test_ids_are_derived_from_names() {
    let store = store();
    let version = store.get_mpack_version_by_id("CORE1.0.0").unwrap();
    assert_eq!(version.mpack_name, "CORE");
    assert_eq!(version.service_ids.len(), 3);

    let service = store.get_service_version_by_id("CORE1.0.0HDFS").unwrap();
    assert_eq!(service.mpack_version_id, "CORE1.0.0");
    assert!(store.get_service_version_by_id("CORE1.1.0YARN").is_none());
}

#[test]
fn test_newest_version() {
    let store = store();
    assert_eq!(store.newest_version("CORE").unwrap().version, "1.1.0");
    assert!(store.newest_version("MISSING").is_none());
}

#[test]
fn test_add_service_version_selects_mpack_version() {
    let mut store = store();
    store.add_service_version("ODS1.0.0HIVE").unwrap();

    assert!(store.get_service_version_by_id("ODS1.0.0HIVE").unwrap().selected);
    assert!(store.get_mpack_version_by_id("ODS1.0.0").unwrap().selected);
}

#[test]
fn test_remove_mpack_version_deselects_services() {
    let mut store = store();
    store.add_service_version("CORE1.0.0HDFS");
    store.add_service_version("CORE1.0.0YARN");

    let version = store.remove_mpack_version("CORE1.0.0").unwrap();
    assert!(!version.selected);
    assert_eq!(store.selected_services().count(), 0);
}

#[test]
fn test_remove_mpack_version_drops_bound_groups() {
    let mut store = store();
    store.add_service_group("CORE1.0.0", "CORE").unwrap();
    store.add_service_instance("CORE1.0.0HDFS", "HDFS", "CORE").unwrap();

    store.remove_mpack_version("CORE1.0.0").unwrap();
    assert!(store.get_service_group("CORE").is_none());
    assert!(store.service_instances().is_empty());
}

#[test]
fn test_add_service_group_rejects_duplicates() {
    let mut store = store();
    assert!(store.add_service_group("CORE1.0.0", "analytics").is_some());
    assert!(store.add_service_group("ODS1.0.0", "analytics").is_none());
    assert_eq!(store.service_groups().len(), 1);
    assert_eq!(store.get_service_group("analytics").unwrap().mpack_version_id, "CORE1.0.0");
}

#[test]
fn test_add_service_group_rejects_name_of_existing_group() {
    let mut store = store();
    store.register_existing_group("CORE1.0.0", "CORE").unwrap();
    assert!(store.add_service_group("CORE1.1.0", "CORE").is_none());
}

#[test]
fn test_add_service_group_unknown_version() {
    let mut store = store();
    assert!(store.add_service_group("NOPE1.0", "g").is_none());
}

#[test]
fn test_add_service_instance_rejects_duplicate_names_in_group() {
    let mut store = store();
    store.add_service_group("CORE1.0.0", "CORE");
    assert!(store.add_service_instance("CORE1.0.0HDFS", "HDFS", "CORE").is_some());
    assert!(store.add_service_instance("CORE1.0.0YARN", "HDFS", "CORE").is_none());
    assert_eq!(store.instances_of("CORE").count(), 1);
}

#[test]
fn test_same_instance_name_in_different_groups() {
    let mut store = store();
    store.add_service_group("CORE1.0.0", "a");
    store.add_service_group("CORE1.0.0", "b");
    assert!(store.add_service_instance("CORE1.0.0HDFS", "HDFS", "a").is_some());
    assert!(store.add_service_instance("CORE1.0.0HDFS", "HDFS", "b").is_some());
}

#[test]
fn test_add_service_instance_requires_matching_mpack_version() {
    let mut store = store();
    store.add_service_group("CORE1.0.0", "CORE");
    assert!(store.add_service_instance("ODS1.0.0HIVE", "HIVE", "CORE").is_none());
    assert!(store.add_service_instance("CORE1.0.0HDFS", "HDFS", "missing").is_none());
    assert_eq!(store.selected_services().count(), 0);
}

#[test]
fn test_remove_last_instance_keeps_group() {
    let mut store = store();
    store.add_service_group("ODS1.0.0", "ODS");
    store.add_service_instance("ODS1.0.0HIVE", "HIVE", "ODS");

    assert!(store.remove_service_instance("HIVE", "ODS"));
    assert!(store.get_service_group("ODS").is_some());
    assert_eq!(store.instances_of("ODS").count(), 0);

    assert!(store.remove_service_group("ODS"));
    assert!(!store.get_mpack_version_by_id("ODS1.0.0").unwrap().selected);
}

#[test]
fn test_remove_service_group_cascades_instances() {
    let mut store = store();
    store.add_service_group("CORE1.0.0", "CORE");
    store.add_service_instance("CORE1.0.0HDFS", "HDFS", "CORE");
    store.add_service_instance("CORE1.0.0YARN", "YARN", "CORE");

    assert!(store.remove_service_group("CORE"));
    assert!(store.service_instances().is_empty());
    assert_eq!(store.selected_services().count(), 0);
}

#[test]
fn test_remove_service_group_keeps_version_used_by_other_group() {
    let mut store = store();
    store.add_service_group("CORE1.0.0", "a");
    store.add_service_group("CORE1.0.0", "b");
    store.add_service_instance("CORE1.0.0HDFS", "HDFS", "a");
    store.add_service_instance("CORE1.0.0YARN", "YARN", "b");

    assert!(store.remove_service_group("a"));
    assert!(store.get_mpack_version_by_id("CORE1.0.0").unwrap().selected);
    assert!(store.get_service_version_by_id("CORE1.0.0YARN").unwrap().selected);
}

#[test]
fn test_existing_groups_cannot_be_removed() {
    let mut store = store();
    store.register_existing_group("CORE1.0.0", "CORE").unwrap();
    store.register_existing_instance("CORE1.0.0HDFS", "HDFS", "CORE").unwrap();

    assert!(!store.remove_service_instance("HDFS", "CORE"));
    assert!(!store.remove_service_group("CORE"));
    assert!(store.remove_mpack_version("CORE1.0.0").is_none());
    assert!(store.remove_service_version("CORE1.0.0HDFS").is_none());
    assert!(store.get_mpack_version_by_id("CORE1.0.0").unwrap().selected);
}

#[test]
fn test_display_mpack_version_moves_focus() {
    let mut store = store();
    store.display_mpack_version("CORE1.0.0");
    store.display_mpack_version("CORE1.1.0");
    store.display_mpack_version("ODS1.0.0");

    assert!(!store.get_mpack_version_by_id("CORE1.0.0").unwrap().displayed);
    assert!(store.get_mpack_version_by_id("CORE1.1.0").unwrap().displayed);
    assert!(store.get_mpack_version_by_id("ODS1.0.0").unwrap().displayed);
    assert_eq!(store.selected_mpack_versions().count(), 0);
}

#[test]
fn test_display_service_version_moves_focus_between_versions() {
    let mut store = store();
    store.display_service_version("CORE1.0.0HDFS");
    store.display_service_version("CORE1.1.0HDFS");

    assert!(!store.get_service_version_by_id("CORE1.0.0HDFS").unwrap().displayed);
    assert!(store.get_service_version_by_id("CORE1.1.0HDFS").unwrap().displayed);
}

#[test]
fn test_toggle_use_case_clears_manual_selection() {
    let mut store = store();
    store.add_service_group("ODS1.0.0", "ODS");
    store.add_service_instance("ODS1.0.0HIVE", "HIVE", "ODS");

    assert_eq!(store.toggle_use_case("Hadoop"), Some(true));
    assert_eq!(store.mode(), SelectionMode::UseCaseDriven);
    assert!(store.service_groups().is_empty());
    assert!(store.service_instances().is_empty());
    assert_eq!(store.selected_mpack_versions().count(), 0);
    assert_eq!(store.selected_services().count(), 0);

    assert_eq!(store.toggle_use_case("Hadoop"), Some(false));
    assert_eq!(store.toggle_use_case("missing"), None);
}

#[test]
fn test_toggle_use_case_keeps_other_use_cases() {
    let mut store = store();
    store.toggle_use_case("Hadoop");
    store.toggle_use_case("DataStore");
    let selected: Vec<_> = store.selected_use_cases().map(|uc| uc.id.as_str()).collect();
    assert_eq!(selected, vec!["DataStore", "Hadoop"]);
}

#[test]
fn test_set_mode_to_manual_deselects_use_cases() {
    let mut store = store();
    store.toggle_use_case("Hadoop");
    assert!(store.set_mode(SelectionMode::Manual));
    assert_eq!(store.selected_use_cases().count(), 0);
    assert!(!store.set_mode(SelectionMode::Manual));
}

#[test]
fn test_clear_selection_keeps_existing_state() {
    let mut store = store();
    store.register_existing_group("CORE1.0.0", "CORE");
    store.register_existing_instance("CORE1.0.0HDFS", "HDFS", "CORE");
    store.add_service_group("ODS1.0.0", "ODS");
    store.add_service_instance("ODS1.0.0HIVE", "HIVE", "ODS");

    store.clear_selection();

    assert_eq!(store.service_groups().len(), 1);
    assert_eq!(store.service_instances().len(), 1);
    assert!(store.get_service_version_by_id("CORE1.0.0HDFS").unwrap().selected);
    assert!(!store.get_mpack_version_by_id("ODS1.0.0").unwrap().selected);
}

#[test]
fn test_load_registry_resets_selection() {
    let mut store = store();
    store.add_service_group("ODS1.0.0", "ODS");
    store.add_service_instance("ODS1.0.0HIVE", "HIVE", "ODS");

    store.load_registry(&fixtures::registry());
    assert!(store.service_groups().is_empty());
    assert_eq!(store.selected_mpack_versions().count(), 0);
}
