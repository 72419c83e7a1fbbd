use phylosplit::format::{DatasetFormat, Format};
use phylosplit::model::{AnnotationValue, Dataset, Rooting};
use phylosplit::newick;
use phylosplit::nexml::{NexmlFormat, NexmlWriter};
use phylosplit::splits::same_topology;
use phylosplit::{PhyloError, read_dataset_file};
use std::path::Path;

fn fixture() -> Dataset {
    let path = Path::new("tests").join("fixtures").join("birds.xml");
    let result = read_dataset_file(path, None);
    if let Err(e) = &result {
        eprintln!("Error parsing birds.xml: {:?}", e);
    }
    result.unwrap()
}

#[test]
fn test_otus_and_trees() {
    let dataset = fixture();

    assert_eq!(dataset.namespace(0).labels(), &["Kakapo", "Kea", "Tui", "Bell bird"]);
    let block = &dataset.trees_blocks()[0];
    assert_eq!(block.title(), Some("Bootstrap"));
    assert_eq!(block.len(), 2);

    let first = &block[0];
    assert_eq!(first.name(), Some("first"));
    assert_eq!(first.rooting(), Rooting::Rooted);
    assert_eq!(first.num_leaves(), 4);
    assert!((first.total_branch_length() - 0.77).abs() < 1e-12);

    let parrots = first.node(first.root().unwrap().children()[0]);
    assert_eq!(parrots.annotations().get("support"), Some(&AnnotationValue::Float(0.95)));
}

#[test]
fn test_node_order_does_not_matter() {
    let mut dataset = fixture();
    let expected = newick::parse_tree("[&R] ((Kakapo,Tui),Kea,'Bell bird');", dataset.namespace_mut(0)).unwrap();

    let second = &dataset.trees_blocks()[0][1];
    assert_eq!(second.num_leaves(), 4);
    assert!(!second.has_branch_lengths());
    assert!(same_topology(second, &expected, dataset.namespace(0)));
    assert_eq!(dataset.namespace(0).len(), 4);
}

#[test]
fn test_missing_root_element() {
    let result = NexmlFormat.read_dataset(&mut "<otus id=\"o\"/>".as_bytes());
    assert!(matches!(result, Err(PhyloError::Parse(_))));
}

#[test]
fn test_cycle_is_rejected() {
    let input = r#"<nexml><otus id="o"><otu id="a"/><otu id="b"/></otus>
        <trees otus="o"><tree id="t">
          <node id="r" root="true"/><node id="x"/><node id="y"/><node id="la" otu="a"/><node id="lb" otu="b"/>
          <edge id="e1" source="r" target="la"/><edge id="e2" source="r" target="lb"/>
          <edge id="e3" source="x" target="y"/><edge id="e4" source="y" target="x"/>
        </tree></trees></nexml>"#;

    let mut dataset = Dataset::new();
    assert!(NexmlFormat.read_str_into(input, &mut dataset).is_err());
    assert_eq!(dataset, Dataset::new());
}

#[test]
fn test_entities_in_labels() {
    let input = r#"<nexml><otus id="o"><otu id="a" label="Wilson&apos;s &amp; Leach&#39;s"/><otu id="b" label="B"/></otus>
        <trees otus="o"><tree id="t"><node id="r"/><node id="la" otu="a"/><node id="lb" otu="b"/>
        <edge id="e1" source="r" target="la"/><edge id="e2" source="r" target="lb"/></tree></trees></nexml>"#;

    let dataset = NexmlFormat.read_dataset(&mut input.as_bytes()).unwrap();
    assert_eq!(dataset.namespace(0).label(0), Some("Wilson's & Leach's"));
    assert_eq!(dataset.trees_blocks()[0][0].rooting(), Rooting::Unrooted);
}

#[test]
fn test_write_then_read_is_stable() {
    let dataset = fixture();

    let mut writer = NexmlWriter::new(Vec::new());
    writer.write_dataset(&dataset).unwrap();
    let written = String::from_utf8(writer.into_inner()).unwrap();
    assert!(written.contains(r#"<otu id="otu0_3" label="Bell bird"/>"#));
    assert!(written.contains(r#"<trees id="trees0" otus="otus0" label="Bootstrap">"#));

    let handler = Format::NeXml.handler();
    let reread = handler.read_dataset(&mut written.as_bytes()).unwrap();
    assert_eq!(reread, dataset);
    assert_eq!(handler.write_string(&reread).unwrap(), written);
}
