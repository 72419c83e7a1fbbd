use phylosplit::PhyloError;
use phylosplit::format::{DatasetFormat, NewickFormat};
use phylosplit::model::{AnnotationValue, BranchLength, Rooting, TaxonNamespace, Tree};
use phylosplit::newick::{self, NewickParser, NewickStyle, NewickWriter};
use phylosplit::parser::ByteParser;
use phylosplit::splits::edge_to_bitmask;
use std::path::Path;

fn leaf_labels(tree: &Tree, namespace: &TaxonNamespace) -> Vec<String> {
    tree.leaves()
        .filter_map(|leaf| leaf.taxon())
        .map(|taxon| namespace[taxon].to_string())
        .collect()
}

#[test]
fn test_basic_tree() {
    let mut namespace = TaxonNamespace::new();
    let tree = newick::parse_tree("((A:0.1,B:0.2):0.3,C:0.4);", &mut namespace).unwrap();

    assert_eq!(tree.num_leaves(), 3);
    assert_eq!(tree.num_internal(), 2);
    assert!(tree.is_valid());
    assert_eq!(namespace.labels(), &["A", "B", "C"]);
    assert_eq!(tree.rooting(), Rooting::Unknown);
    assert!((tree.total_branch_length() - 1.0).abs() < 1e-12);
    assert_eq!(tree.root().unwrap().branch_length(), None);
}

#[test]
fn test_root_branch_length() {
    let mut namespace = TaxonNamespace::new();
    let tree = newick::parse_tree("(A:1,B:2):0.5;", &mut namespace).unwrap();
    assert_eq!(tree.root().unwrap().branch_length(), BranchLength::new(0.5));
}

#[test]
fn test_quoted_and_underscored_labels() {
    let mut namespace = TaxonNamespace::new();
    let tree = newick::parse_tree("('Apteryx haastii',Apteryx_owenii,'it''s_quoted');", &mut namespace).unwrap();

    assert_eq!(leaf_labels(&tree, &namespace), vec!["Apteryx haastii", "Apteryx owenii", "it's_quoted"]);
}

#[test]
fn test_preserve_underscores() {
    let mut namespace = TaxonNamespace::new();
    let mut parser = ByteParser::for_str("(Apteryx_owenii,B);");
    let tree = NewickParser::new()
        .with_preserve_underscores()
        .parse_str(&mut parser, &mut namespace)
        .unwrap();

    assert_eq!(leaf_labels(&tree, &namespace), vec!["Apteryx_owenii", "B"]);
}

#[test]
fn test_scientific_notation() {
    let mut namespace = TaxonNamespace::new();
    let tree = newick::parse_tree("(A:1.5e-3,B:2E2);", &mut namespace).unwrap();
    let lengths: Vec<f64> = tree.leaves().filter_map(|leaf| leaf.branch_length()).map(|l| l.value()).collect();
    assert_eq!(lengths, vec![0.0015, 200.0]);
}

#[test]
fn test_comments_and_rooting_tokens() {
    let mut namespace = TaxonNamespace::new();
    let tree = newick::parse_tree("[a tree] [&R] ((A,[inner] B)[note],C) ;", &mut namespace).unwrap();
    assert_eq!(tree.rooting(), Rooting::Rooted);
    assert_eq!(tree.num_leaves(), 3);

    let tree = newick::parse_tree("[&U](A,B,C);", &mut namespace).unwrap();
    assert_eq!(tree.rooting(), Rooting::Unrooted);
}

#[test]
fn test_default_rooting() {
    let mut namespace = TaxonNamespace::new();
    let mut parser = ByteParser::for_str("(A,B); [&U] (A,B);");
    let trees = NewickParser::new()
        .with_default_rooting(Rooting::Rooted)
        .parse_all(&mut parser, &mut namespace)
        .unwrap();

    assert_eq!(trees[0].rooting(), Rooting::Rooted);
    assert_eq!(trees[1].rooting(), Rooting::Unrooted);
}

#[test]
fn test_rooting_of_every_tree_in_sequence() {
    let mut namespace = TaxonNamespace::new();
    let trees = newick::parse_trees(
        "[&R] (A,(B,C));\n[&U] (A,(B,C));\n(A,(B,C));\n[run 2] [&R](A,(B,C));",
        &mut namespace,
    )
    .unwrap();

    let rootings: Vec<Rooting> = trees.iter().map(Tree::rooting).collect();
    assert_eq!(rootings, vec![Rooting::Rooted, Rooting::Unrooted, Rooting::Unknown, Rooting::Rooted]);
}

#[test]
fn test_rooted_tree_keeps_directional_split() {
    let dataset = NewickFormat.read_dataset(&mut "[&R] (A,(B,C));".as_bytes()).unwrap();
    let tree = &dataset.trees_blocks()[0][0];
    assert_eq!(tree.rooting(), Rooting::Rooted);

    let bc = tree.root().unwrap().children()[1];
    let split = edge_to_bitmask(tree, bc, dataset.namespace(0));
    assert_eq!(split.to_u64(), Some(0b110));
    assert_eq!(NewickFormat.write_string(&dataset).unwrap(), "[&R] (A,(B,C));\n");
}

#[test]
fn test_annotations() {
    let mut namespace = TaxonNamespace::new();
    let tree = newick::parse_tree(
        "((A[&rate=0.5],B)[&support=95,color=red,name=\"x y\"]:1,C);",
        &mut namespace,
    )
    .unwrap();

    let root = tree.root().unwrap();
    let ab = tree.node(root.children()[0]);
    assert_eq!(ab.annotations().get("support"), Some(&AnnotationValue::Int(95)));
    assert_eq!(ab.annotations().get("color"), Some(&AnnotationValue::String("red".to_string())));
    assert_eq!(ab.annotations().get("name"), Some(&AnnotationValue::String("x y".to_string())));
    assert_eq!(ab.branch_length(), BranchLength::new(1.0));

    let a = tree.node(ab.children()[0]);
    assert_eq!(a.annotations().get("rate"), Some(&AnnotationValue::Float(0.5)));
}

#[test]
fn test_annotations_disabled() {
    let mut namespace = TaxonNamespace::new();
    let mut parser = ByteParser::for_str("((A,B)[&support=95],C);");
    let tree = NewickParser::new()
        .without_annotations()
        .parse_str(&mut parser, &mut namespace)
        .unwrap();
    assert!(tree.nodes().iter().all(|node| node.annotations().is_empty()));
}

#[test]
fn test_internal_labels() {
    let mut namespace = TaxonNamespace::new();
    let tree = newick::parse_tree("((A,B)Moa,(C,D)'Kiwi clade')Root;", &mut namespace).unwrap();

    let root = tree.root().unwrap();
    assert_eq!(root.label(), Some("Root"));
    assert_eq!(tree.node(root.children()[0]).label(), Some("Moa"));
    assert_eq!(tree.node(root.children()[1]).label(), Some("Kiwi clade"));
    assert_eq!(namespace.len(), 4);
}

#[test]
fn test_missing_semicolon() {
    let mut namespace = TaxonNamespace::new();
    let result = newick::parse_tree("((A,B),C)", &mut namespace);
    assert!(matches!(result, Err(PhyloError::Parse(_))));
}

#[test]
fn test_missing_comma() {
    let mut namespace = TaxonNamespace::new();
    assert!(newick::parse_tree("((A,B)C D);", &mut namespace).is_err());
}

#[test]
fn test_unmatched_parentheses() {
    let mut namespace = TaxonNamespace::new();
    assert!(newick::parse_tree("((A,B),C;", &mut namespace).is_err());
    assert!(newick::parse_tree("(A,B));", &mut namespace).is_err());
}

#[test]
fn test_invalid_branch_length() {
    let mut namespace = TaxonNamespace::new();
    let err = newick::parse_tree("(A:abc,B);", &mut namespace).unwrap_err();
    let parsing_error = err.as_parsing_error().unwrap();
    assert_eq!(parsing_error.line(), 1);
    assert!(err.to_string().contains("branch length"));
}

#[test]
fn test_failed_parse_restores_namespace() {
    let mut namespace = TaxonNamespace::from_labels(["A"]);
    assert!(newick::parse_tree("(A,B,C,", &mut namespace).is_err());
    assert_eq!(namespace.labels(), &["A"]);

    assert!(newick::parse_trees("(A,D);(E,", &mut namespace).is_err());
    assert_eq!(namespace.labels(), &["A"]);
}

#[test]
fn test_shared_namespace_positions() {
    let mut namespace = TaxonNamespace::new();
    let trees = newick::parse_trees("(C,(B,A));\n(A,(D,C));", &mut namespace).unwrap();

    assert_eq!(trees.len(), 2);
    assert_eq!(namespace.labels(), &["C", "B", "A", "D"]);
    assert_eq!(namespace.index_of("A"), Some(2));
}

#[test]
fn test_parsing_newick_file() {
    let path = Path::new("tests").join("fixtures").join("birds.nwk");
    let mut namespace = TaxonNamespace::new();
    let trees = newick::parse_file(path, &mut namespace).unwrap();

    assert_eq!(trees.len(), 3);
    assert_eq!(namespace.labels(), &["Kakapo", "Kea", "Tui", "Bell bird"]);
    for tree in &trees {
        assert_eq!(tree.num_leaves(), 4);
        assert!(tree.is_rooted());
        assert!(tree.validate_against(&namespace).is_ok());
    }

    let support = trees[0].node(trees[0].root().unwrap().children()[0]).annotations().get("support");
    assert_eq!(support, Some(&AnnotationValue::Float(0.95)));
}

#[test]
fn test_writer_options() {
    let mut namespace = TaxonNamespace::new();
    let tree = newick::parse_tree("[&R] ((A:1,B:2)X[&support=95]:0.5,'C c':3);", &mut namespace).unwrap();

    assert_eq!(
        NewickWriter::new().write_tree(&tree, &namespace).unwrap(),
        "[&R] ((A:1,B:2)X[&support=95]:0.5,C_c:3);"
    );
    assert_eq!(
        NewickWriter::new()
            .without_edge_lengths()
            .without_annotations()
            .without_internal_labels()
            .without_rooting_token()
            .write_tree(&tree, &namespace)
            .unwrap(),
        "((A,B),C_c);"
    );
    assert_eq!(
        NewickWriter::new()
            .with_style(NewickStyle::OneIndexed)
            .without_annotations()
            .write_tree(&tree, &namespace)
            .unwrap(),
        "[&R] ((1:1,2:2)X:0.5,3:3);"
    );
}

#[test]
fn test_write_then_read_is_stable() {
    let path = Path::new("tests").join("fixtures").join("birds.nwk");
    let mut namespace = TaxonNamespace::new();
    let trees = newick::parse_file(path, &mut namespace).unwrap();

    let mut out = Vec::new();
    NewickWriter::new().write_trees(&mut out, &trees, &namespace).unwrap();
    let written = String::from_utf8(out).unwrap();

    let mut reread_namespace = TaxonNamespace::new();
    let reread = newick::parse_trees(&written, &mut reread_namespace).unwrap();
    assert_eq!(reread_namespace, namespace);
    assert_eq!(reread, trees);
}
