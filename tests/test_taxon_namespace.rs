use phylosplit::format::{DatasetFormat, NewickFormat, NexmlFormat, NexusFormat, read_file_into};
use phylosplit::model::{Dataset, TaxonNamespace};
use phylosplit::splits::{SplitDistribution, parse_group_to_mask};
use phylosplit::PhyloError;
use std::path::Path;

#[test]
fn test_labels_keep_their_index() {
    let mut namespace = TaxonNamespace::new();
    let kea = namespace.get_or_insert("Kea");
    let kaka = namespace.get_or_insert("Kaka");

    assert_eq!(namespace.get_or_insert("Kea"), kea);
    assert_eq!(namespace.index_of("Kaka"), Some(kaka));
    assert_eq!(namespace.label(kea), Some("Kea"));
    assert_eq!(namespace.len(), 2);
    assert!(matches!(namespace.require("Kakapo"), Err(PhyloError::LabelMismatch { .. })));
}

#[test]
fn test_separate_reads_create_separate_namespaces() {
    let mut dataset = Dataset::new();
    NewickFormat.read_str_into("((A,B),C);", &mut dataset).unwrap();
    NewickFormat.read_str_into("((C,B),A);", &mut dataset).unwrap();

    assert_eq!(dataset.namespaces().len(), 2);
    assert_eq!(dataset.namespace(1).labels(), &["C", "B", "A"]);
}

#[test]
fn test_attached_namespace_spans_formats() {
    let mut dataset = Dataset::new();
    let shared = dataset.add_namespace(TaxonNamespace::new());
    dataset.attach_namespace(shared).unwrap();

    let fixtures = Path::new("tests").join("fixtures");
    read_file_into(fixtures.join("birds.nex"), None, &mut dataset).unwrap();
    read_file_into(fixtures.join("birds.xml"), None, &mut dataset).unwrap();
    read_file_into(fixtures.join("birds.nwk"), None, &mut dataset).unwrap();

    assert_eq!(dataset.namespaces().len(), 1);
    assert_eq!(dataset.namespace(shared).labels(), &["Kakapo", "Kea", "Tui", "Bell bird", "Takahe"]);
    assert_eq!(dataset.num_trees(), 8);
    for (tree, namespace) in dataset.trees() {
        assert!(tree.validate_against(namespace).is_ok());
    }

    // Bit positions are comparable across all eight trees
    let mut distribution = SplitDistribution::new(5, false).without_leaf_splits();
    for (tree, namespace) in dataset.trees() {
        distribution.count_splits_on_tree(tree, namespace).unwrap();
    }
    assert_eq!(distribution.total_trees_counted(), 8);
    let parrots = parse_group_to_mask("**...", 5, false).unwrap();
    assert_eq!(distribution.split_count(&parrots), 6);
}

#[test]
fn test_failed_read_keeps_attached_namespace() {
    let mut dataset = Dataset::new();
    let shared = dataset.add_namespace(TaxonNamespace::from_labels(["A", "B"]));
    dataset.attach_namespace(shared).unwrap();

    let bad_nexml = r#"<nexml><otus id="o"><otu id="c" label="C"/></otus><trees otus="missing"/></nexml>"#;
    assert!(matches!(
        NexmlFormat.read_str_into(bad_nexml, &mut dataset),
        Err(PhyloError::LabelMismatch { .. })
    ));
    assert!(NexusFormat.read_str_into("#NEXUS BEGIN TREES; TREE t = (A,(B,D);", &mut dataset).is_err());

    assert_eq!(dataset.namespace(shared).labels(), &["A", "B"]);
    assert_eq!(dataset.attached_namespace(), Some(shared));
    assert_eq!(dataset.num_trees(), 0);
}
