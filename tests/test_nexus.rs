use phylosplit::format::DatasetFormat;
use phylosplit::model::{Dataset, Rooting, TaxonNamespace};
use phylosplit::nexus::{self, NexusFormat, NexusParser, NexusWriter};
use phylosplit::parser::ByteParser;
use phylosplit::{PhyloError, parse_nexus_file};
use std::path::Path;

fn parse(input: &str) -> Result<Dataset, PhyloError> {
    let mut dataset = Dataset::new();
    NexusFormat.read_str_into(input, &mut dataset)?;
    Ok(dataset)
}

#[test]
fn test_taxa_translate_and_unknown_blocks() {
    let path = Path::new("tests").join("fixtures").join("birds.nex");
    let result = parse_nexus_file(path);
    if let Err(e) = &result {
        eprintln!("Error parsing birds.nex: {:?}", e);
    }
    let dataset = result.unwrap();

    assert_eq!(dataset.namespaces().len(), 1);
    let namespace = dataset.namespace(0);
    assert_eq!(namespace.labels(), &["Kakapo", "Kea", "Tui", "Bell bird", "Takahe"]);

    assert_eq!(dataset.trees_blocks().len(), 1);
    let block = &dataset.trees_blocks()[0];
    assert_eq!(block.len(), 3);
    let names: Vec<_> = block.trees().iter().map(|tree| tree.name()).collect();
    assert_eq!(names, vec![Some("rep1"), Some("rep2"), Some("rep3")]);

    for tree in block.trees() {
        assert_eq!(tree.rooting(), Rooting::Unrooted);
        assert_eq!(tree.num_leaves(), 5);
        assert!(tree.validate_against(namespace).is_ok());
    }
}

#[test]
fn test_trees_without_taxa_block() {
    let dataset = parse(
        "#NEXUS
        BEGIN TREES;
            TREE one = ((Moa,Emu),Kiwi);
            TREE two = (Kiwi,(Moa,Emu));
        END;",
    )
    .unwrap();

    assert_eq!(dataset.namespace(0).labels(), &["Moa", "Emu", "Kiwi"]);
    assert_eq!(dataset.num_trees(), 2);
}

#[test]
fn test_numbers_without_translate_are_taxa_indices() {
    let dataset = parse(
        "#NEXUS
        BEGIN TAXA; DIMENSIONS NTAX=3; TAXLABELS Moa Emu Kiwi; END;
        BEGIN TREES; TREE t = (3,(1,2)); END;",
    )
    .unwrap();

    let tree = &dataset.trees_blocks()[0][0];
    let first_leaf = tree.leaves().next().unwrap();
    assert_eq!(first_leaf.taxon(), Some(2));
}

#[test]
fn test_undeclared_label_is_label_mismatch() {
    let result = parse(
        "#NEXUS
        BEGIN TAXA; DIMENSIONS NTAX=2; TAXLABELS Moa Emu; END;
        BEGIN TREES; TREE t = (Moa,Kiwi); END;",
    );
    assert!(matches!(result, Err(PhyloError::LabelMismatch { label, .. }) if label.contains("Kiwi")));
}

#[test]
fn test_failed_read_leaves_dataset_unchanged() {
    let mut dataset = parse("#NEXUS\nBEGIN TREES; TREE t = (A,B); END;").unwrap();
    let before = dataset.clone();

    let result = NexusFormat.read_str_into("#NEXUS\nBEGIN TREES; TREE t = (C,D); TREE u = (C,", &mut dataset);
    assert!(result.is_err());
    assert_eq!(dataset, before);
}

#[test]
fn test_missing_header() {
    let result = parse("BEGIN TREES; TREE t = (A,B); END;");
    let err = result.unwrap_err();
    assert!(err.as_parsing_error().is_some());
    assert!(err.to_string().contains("#NEXUS"));
}

#[test]
fn test_case_insensitive_keywords_and_comments() {
    let dataset = parse(
        "#nexus
        [comment before block]
        begin trees; [comment in block]
            tree [inline] t1 = [&R] ((A:1,B:1):1,C:2);
        endblock;",
    )
    .unwrap();

    let tree = &dataset.trees_blocks()[0][0];
    assert_eq!(tree.name(), Some("t1"));
    assert!(tree.is_rooted());
}

#[test]
fn test_linked_taxa_blocks() {
    let dataset = parse(
        "#NEXUS
        BEGIN TAXA; TITLE Birds; DIMENSIONS NTAX=2; TAXLABELS Moa Emu; END;
        BEGIN TAXA; TITLE Plants; DIMENSIONS NTAX=2; TAXLABELS Rimu Totara; END;
        BEGIN TREES; LINK TAXA = Plants; TREE p = (Rimu,Totara); END;
        BEGIN TREES; LINK TAXA = Birds; TREE b = (Emu,Moa); END;",
    )
    .unwrap();

    assert_eq!(dataset.namespaces().len(), 2);
    assert_eq!(dataset.trees_blocks()[0].namespace(), 1);
    assert_eq!(dataset.trees_blocks()[1].namespace(), 0);
}

#[test]
fn test_attached_namespace_is_shared() {
    let mut dataset = Dataset::new();
    let shared = dataset.add_namespace(TaxonNamespace::from_labels(["C", "B", "A"]));
    dataset.attach_namespace(shared).unwrap();

    NexusFormat.read_str_into("#NEXUS\nBEGIN TREES; TREE t = (A,(B,D)); END;", &mut dataset).unwrap();

    assert_eq!(dataset.namespaces().len(), 1);
    assert_eq!(dataset.namespace(shared).labels(), &["C", "B", "A", "D"]);
}

#[test]
fn test_parser_over_byte_parser() {
    let mut dataset = Dataset::new();
    let mut parser = NexusParser::new(ByteParser::for_str("#NEXUS BEGIN TREES; TREE t = (A,B); END;"));
    parser.parse_into(&mut dataset).unwrap();
    assert_eq!(dataset.num_trees(), 1);
}

#[test]
fn test_write_then_read_is_stable() {
    let path = Path::new("tests").join("fixtures").join("birds.nex");
    let dataset = nexus::parse_file(path).unwrap();

    let mut writer = NexusWriter::new(Vec::new());
    writer.write_dataset(&dataset).unwrap();
    let written = String::from_utf8(writer.into_inner()).unwrap();
    assert!(written.starts_with("#NEXUS"));
    assert!(written.contains("'Bell bird'") || written.contains("Bell_bird"));

    let reread = parse(&written).unwrap();
    assert_eq!(reread, dataset);
    assert_eq!(NexusFormat.write_string(&reread).unwrap(), written);
}
