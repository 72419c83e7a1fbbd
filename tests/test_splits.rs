use phylosplit::PhyloError;
use phylosplit::model::TaxonNamespace;
use phylosplit::newick;
use phylosplit::splits::{
    Bitmask, edge_to_bitmask, is_normalized, normalize, parse_group_to_mask, same_topology, split_as_string,
    tree_bitmasks,
};
use proptest::prelude::*;

fn reversed(s: &str) -> String {
    s.chars().rev().collect()
}

#[test]
fn test_single_inner_split_encodes_to_one() {
    let mut namespace = TaxonNamespace::new();
    let tree = newick::parse_tree("(A,(B,C));", &mut namespace).unwrap();
    assert_eq!(namespace.labels(), &["A", "B", "C"]);

    let root = tree.root().unwrap();
    let bc = root.children()[1];
    let split = edge_to_bitmask(&tree, bc, &namespace);
    assert_eq!(split.to_u64(), Some(1));

    // Raw leaf set is {B,C}
    let raw = tree_bitmasks(&tree, &namespace)[bc].clone().unwrap();
    assert_eq!(raw.to_u64(), Some(0b110));
}

#[test]
fn test_group_string_inverse_for_all_eight_bit_masks() {
    for value in 0u64..256 {
        let mask = Bitmask::from_u64(value, 8);
        let group = reversed(&split_as_string(&mask, '.', '*'));
        assert_eq!(parse_group_to_mask(&group, 8, false).unwrap(), mask, "value {value}");
    }
}

#[test]
fn test_split_as_string_order() {
    // Taxon 0 is the last character
    let mask = Bitmask::from_taxa(5, [0, 3]);
    assert_eq!(split_as_string(&mask, '.', '*'), ".*..*");
    assert_eq!(split_as_string(&mask, '0', '1'), "01001");
    assert_eq!(mask.to_string(), ".*..*");
}

#[test]
fn test_group_string_errors() {
    assert!(matches!(
        parse_group_to_mask("*.*", 4, true),
        Err(PhyloError::DimensionMismatch { expected: 4, found: 3 })
    ));
    assert!(matches!(
        parse_group_to_mask("*.-.", 4, true),
        Err(PhyloError::InvalidSplitSymbol { symbol: '-', position: 2 })
    ));
    assert_eq!(parse_group_to_mask(" *\t.\n* . ", 4, false).unwrap(), Bitmask::from_u64(0b0101, 4));
}

#[test]
fn test_split_positions_follow_shared_namespace() {
    let mut namespace = TaxonNamespace::new();
    let trees = newick::parse_trees("((A,B),(C,D));((D,C),(B,A));(((A,C),B),D);", &mut namespace).unwrap();

    assert!(same_topology(&trees[0], &trees[1], &namespace));
    assert!(!same_topology(&trees[0], &trees[2], &namespace));
}

#[test]
fn test_wide_namespace() {
    let labels: Vec<String> = (0..100).map(|i| format!("T{i}")).collect();
    let inner = labels[1..].join(",");
    let mut namespace = TaxonNamespace::new();
    let tree = newick::parse_tree(format!("({},({}));", labels[0], inner), &mut namespace).unwrap();

    let root = tree.root().unwrap();
    let split = edge_to_bitmask(&tree, root.children()[1], &namespace);
    assert_eq!(split.width(), 100);
    assert_eq!(split.count_ones(), 1);
    assert!(split.contains(0));
    assert_eq!(split.to_u64(), Some(1));
}

fn any_mask() -> impl Strategy<Value = Bitmask> {
    (1usize..200)
        .prop_flat_map(|width| proptest::collection::vec(any::<bool>(), width))
        .prop_map(|bits| {
            let taxa = bits.iter().enumerate().filter(|(_, bit)| **bit).map(|(i, _)| i);
            Bitmask::from_taxa(bits.len(), taxa)
        })
}

proptest! {
    #[test]
    fn prop_normalize_is_idempotent(mask in any_mask()) {
        let normalized = normalize(&mask);
        prop_assert!(is_normalized(&normalized));
        prop_assert_eq!(normalize(&normalized), normalized);
    }

    #[test]
    fn prop_normalize_ignores_complement(mask in any_mask()) {
        prop_assert_eq!(normalize(&mask), normalize(&mask.complement()));
        prop_assert_eq!(mask.complement().complement(), mask.clone());
        prop_assert_eq!(mask.count_ones() + mask.complement().count_ones(), mask.width());
    }

    #[test]
    fn prop_group_string_inverse(mask in any_mask()) {
        let group = reversed(&split_as_string(&mask, '.', '*'));
        prop_assert_eq!(parse_group_to_mask(&group, mask.width(), false).unwrap(), mask.clone());
        prop_assert_eq!(parse_group_to_mask(&group, mask.width(), true).unwrap(), normalize(&mask));
    }

    #[test]
    fn prop_u64_round_trip(value in any::<u64>()) {
        prop_assert_eq!(Bitmask::from_u64(value, 64).to_u64(), Some(value));
    }
}
