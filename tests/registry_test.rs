//! Tests for HierarchyRegistry

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use dataforge::util::testing::init_test_setup;
use dataforge::{
    ApplicationError, DomainError, FileHierarchySource, HierarchyRegistry, Settings,
    StaticHierarchySource,
};

/// Helper to create a properties file inside a temp data dir
fn create_properties_file(dir: &TempDir, nesting: &str, content: &str) -> PathBuf {
    let path = dir.path().join(format!("{nesting}.properties"));
    std::fs::write(&path, content).expect("write properties file");
    path
}

fn static_registry(nesting: &str, text: &str) -> HierarchyRegistry {
    HierarchyRegistry::new(Arc::new(StaticHierarchySource::new().with(nesting, text)))
}

#[test]
fn given_composite_entries_when_parsing_then_subsets_keep_declaration_order() {
    init_test_setup();
    let registry = static_registry("region", "world = europe, asia\neurope = DE, AT");

    let graph = registry.graph("region").unwrap();

    let world = graph.get("world").expect("world node");
    assert_eq!(graph.subset_names(world), vec!["europe", "asia"]);
    let europe = graph.get("europe").expect("europe node");
    assert_eq!(graph.subset_names(europe), vec!["DE", "AT"]);
}

#[test]
fn given_names_used_only_as_values_when_parsing_then_they_become_atomic_leaves() {
    let registry = static_registry("region", "world = europe, asia\neurope = DE, AT");

    let graph = registry.graph("region").unwrap();

    assert!(graph.info("DE").unwrap().atomic);
    assert!(graph.info("asia").unwrap().atomic);
    assert!(!graph.info("europe").unwrap().atomic);
}

#[test]
fn given_comments_and_padding_when_parsing_then_tokens_are_trimmed() {
    let registry = static_registry(
        "region",
        "# continents first\n! legacy comment\n  dach =  DE , AT ,CH  \n\n",
    );

    let graph = registry.graph("region").unwrap();

    let dach = graph.get("dach").expect("dach node");
    assert_eq!(graph.subset_names(dach), vec!["DE", "AT", "CH"]);
    assert!(!graph.contains("# continents first"));
}

#[test]
fn given_two_lookups_when_loading_same_nesting_then_graph_is_parsed_once() {
    let registry = static_registry("region", "dach = DE, AT, CH");

    let first = registry.graph("region").unwrap();
    let second = registry.graph("region").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn given_unknown_nesting_when_loading_then_source_unavailable_error() {
    let registry = static_registry("region", "dach = DE, AT, CH");

    let result = registry.graph("products");

    assert!(matches!(
        result,
        Err(ApplicationError::SourceUnavailable { nesting, .. }) if nesting == "products"
    ));
}

#[test]
fn given_unknown_dataset_name_when_resolving_then_fresh_atomic_descriptor() {
    let registry = static_registry("region", "dach = DE, AT, CH");

    let info = registry.dataset("region", "narnia").unwrap();

    assert_eq!(info.name, "narnia");
    assert_eq!(info.nesting, "region");
    assert!(info.atomic);
    // the parsed taxonomy itself stays untouched
    assert!(!registry.graph("region").unwrap().contains("narnia"));
}

#[test]
fn given_nested_composites_when_collecting_atomic_descendants_then_pre_order() {
    let registry = static_registry("region", "world = europe, asia\neurope = DE, AT");

    let descendants = registry.atomic_descendants("region", "world").unwrap();

    assert_eq!(descendants, vec!["DE", "AT", "asia"]);
}

#[test]
fn given_unknown_name_when_collecting_atomic_descendants_then_it_is_its_own_leaf() {
    let registry = static_registry("region", "dach = DE, AT, CH");

    let descendants = registry.atomic_descendants("region", "narnia").unwrap();

    assert_eq!(descendants, vec!["narnia"]);
}

#[test]
fn given_dataset_in_two_composites_when_parsing_then_both_parent_links_exist() {
    let registry = static_registry("region", "dach = DE, AT\nemea = DE, IL");

    let graph = registry.graph("region").unwrap();

    let de = graph.get("DE").expect("DE node");
    assert_eq!(graph.node(de).unwrap().parents.len(), 2);
}

#[test]
fn given_mutually_referencing_datasets_when_parsing_then_cycle_is_rejected() {
    let registry = static_registry("region", "a = b\nb = a");

    let result = registry.graph("region");

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::CycleDetected { .. }))
    ));
}

#[test]
fn given_properties_files_in_data_dir_when_listing_then_nestings_are_found() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    create_properties_file(&temp, "region", "dach = DE, AT, CH");
    create_properties_file(&temp, "sector", "industry = auto, chem");

    let source = Arc::new(FileHierarchySource::new(temp.path()));
    let registry = HierarchyRegistry::new(source);

    assert_eq!(registry.available_nestings().unwrap(), vec!["region", "sector"]);
}

#[test]
fn given_file_backed_source_when_loading_then_graph_matches_file_contents() {
    let temp = TempDir::new().unwrap();
    create_properties_file(&temp, "region", "dach = DE, AT, CH");

    let registry = HierarchyRegistry::new(Arc::new(FileHierarchySource::new(temp.path())));
    let graph = registry.graph("region").unwrap();

    let dach = graph.get("dach").expect("dach node");
    assert_eq!(graph.subset_names(dach), vec!["DE", "AT", "CH"]);
}

#[test]
fn given_settings_with_data_dir_when_building_registry_then_files_are_served() {
    let temp = TempDir::new().unwrap();
    create_properties_file(&temp, "region", "dach = DE, AT, CH");
    let settings = Settings {
        data_dir: temp.path().to_path_buf(),
        ..Settings::default()
    };

    let registry = HierarchyRegistry::from_settings(&settings);

    assert!(registry.graph("region").unwrap().contains("dach"));
}

#[test]
fn given_parsed_graph_when_rendering_then_subsets_are_indented_below_their_parent() {
    let registry = static_registry("region", "dach = DE, AT, CH");
    let graph = registry.graph("region").unwrap();

    let rendered = format!("{}", graph.to_tree_string(graph.get("dach").unwrap()));

    assert!(rendered.starts_with("dach"));
    assert!(rendered.contains("DE"));
    assert!(rendered.contains("CH"));
}
