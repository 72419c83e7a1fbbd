//! Encoding of tree edges as splits and conversion between splits and
//! group strings.

use crate::error::{PhyloError, Result};
use crate::model::node::NodeIndex;
use crate::model::taxon_namespace::TaxonNamespace;
use crate::model::tree::Tree;
use crate::splits::bitmask::Bitmask;
use std::collections::HashSet;

// =#========================================================================#=
// NORMALIZATION
// =#========================================================================#=
/// Returns the canonical form of an unrooted split: whichever of `mask`
/// and its complement has the bit of taxon 0 set.
///
/// Normalizing is idempotent and maps a mask and its complement to the same
/// value. A mask of width 0 is returned unchanged.
///
/// # Example
/// ```
/// use phylosplit::splits::{Bitmask, normalize};
///
/// let bc = Bitmask::from_u64(0b110, 3);
/// assert_eq!(normalize(&bc), Bitmask::from_u64(0b001, 3));
/// assert_eq!(normalize(&bc), normalize(&bc.complement()));
/// ```
pub fn normalize(mask: &Bitmask) -> Bitmask {
    if mask.width() == 0 || mask.contains(0) {
        mask.clone()
    } else {
        mask.complement()
    }
}

/// Returns whether `mask` is its own [normalize]d form.
pub fn is_normalized(mask: &Bitmask) -> bool {
    mask.width() == 0 || mask.contains(0)
}

// ============================================================================
// Group strings (pub)
// ============================================================================
/// Renders a split with one character per taxon, most significant taxon
/// first: taxon 0 is the last character.
///
/// # Example
/// ```
/// use phylosplit::splits::{Bitmask, split_as_string};
///
/// assert_eq!(split_as_string(&Bitmask::from_u64(0b0011, 4), '.', '*'), "..**");
/// assert_eq!(split_as_string(&Bitmask::from_u64(0b0011, 4), '0', '1'), "0011");
/// ```
pub fn split_as_string(mask: &Bitmask, zero: char, one: char) -> String {
    (0..mask.width())
        .rev()
        .map(|taxon| if mask.contains(taxon) { one } else { zero })
        .collect()
}

/// Parses a group string into a split of the given width.
///
/// The group string has one character per taxon in namespace order
/// (taxon 0 first): `*` puts the taxon into the group, `.` leaves it out.
/// Whitespace is ignored. With `normalized`, the result is [normalize]d.
///
/// # Errors
/// Returns [PhyloError::InvalidSplitSymbol] for any other character, and
/// [PhyloError::DimensionMismatch] if the number of symbols is not `width`.
///
/// # Example
/// ```
/// use phylosplit::splits::{Bitmask, parse_group_to_mask};
///
/// let mask = parse_group_to_mask(".** ..", 5, false).unwrap();
/// assert_eq!(mask, Bitmask::from_u64(0b00110, 5));
///
/// let normalized = parse_group_to_mask(".**..", 5, true).unwrap();
/// assert_eq!(normalized, Bitmask::from_u64(0b11001, 5));
/// ```
pub fn parse_group_to_mask(group: &str, width: usize, normalized: bool) -> Result<Bitmask> {
    let mut mask = Bitmask::zeros(width);
    let mut position = 0;

    for symbol in group.chars().filter(|c| !c.is_whitespace()) {
        let is_member = match symbol {
            '*' => true,
            '.' => false,
            _ => return Err(PhyloError::InvalidSplitSymbol { symbol, position }),
        };
        if is_member && position < width {
            mask.insert(position);
        }
        position += 1;
    }

    if position != width {
        return Err(PhyloError::DimensionMismatch { expected: width, found: position });
    }

    Ok(if normalized { normalize(&mask) } else { mask })
}

// =#========================================================================#=
// TREE ENCODING
// =#========================================================================#=
/// Computes the raw leaf set below every node in a single post-order pass.
///
/// The result is indexed by [NodeIndex]; nodes not reachable from the root
/// have `None`. Masks are not normalized, so the mask of a node is exactly
/// the set of taxa of its descendant leaves.
///
/// # Panics
/// Panics if a leaf's taxon is outside `namespace`. Trees produced by the
/// parsers against the same namespace always fit.
pub fn tree_bitmasks(tree: &Tree, namespace: &TaxonNamespace) -> Vec<Option<Bitmask>> {
    let width = namespace.len();
    let mut masks: Vec<Option<Bitmask>> = vec![None; tree.num_nodes()];

    for node in tree.post_order_iter() {
        let mut mask = Bitmask::zeros(width);
        if let Some(taxon) = node.taxon() {
            mask.insert(taxon);
        }
        for &child in node.children() {
            if let Some(child_mask) = &masks[child] {
                mask.union_with(child_mask);
            }
        }
        masks[node.index()] = Some(mask);
    }

    masks
}

/// Returns the split of the edge leading into `node`: the taxa of all
/// leaves below it, [normalize]d unless the tree is rooted.
///
/// # Panics
/// Panics if `node` is not a node of `tree` or a leaf's taxon is outside
/// `namespace`.
///
/// # Example
/// ```
/// use phylosplit::model::TaxonNamespace;
/// use phylosplit::newick;
/// use phylosplit::splits::{Bitmask, edge_to_bitmask};
///
/// let mut namespace = TaxonNamespace::new();
/// let tree = newick::parse_tree("(A,(B,C));", &mut namespace).unwrap();
/// let bc = tree.node(tree.root_index().unwrap()).children()[1];
///
/// // {B,C} and its complement {A} are the same unrooted split
/// assert_eq!(edge_to_bitmask(&tree, bc, &namespace), Bitmask::from_u64(1, 3));
/// ```
pub fn edge_to_bitmask(tree: &Tree, node: NodeIndex, namespace: &TaxonNamespace) -> Bitmask {
    let mut mask = Bitmask::zeros(namespace.len());
    let mut stack = vec![node];
    while let Some(index) = stack.pop() {
        let current = tree.node(index);
        if let Some(taxon) = current.taxon() {
            mask.insert(taxon);
        }
        stack.extend_from_slice(current.children());
    }

    if tree.is_rooted() { mask } else { normalize(&mask) }
}

/// Returns the set of non-trivial splits of a tree, including the splits of
/// leaf edges but not the edge above the root. Splits are normalized unless
/// `rooted` is set.
pub fn tree_splits(tree: &Tree, namespace: &TaxonNamespace, rooted: bool) -> HashSet<Bitmask> {
    let root = tree.root_index();
    tree_bitmasks(tree, namespace)
        .into_iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != root)
        .filter_map(|(_, mask)| mask)
        .map(|mask| if rooted { mask } else { normalize(&mask) })
        .filter(|mask| !mask.is_trivial())
        .collect()
}

/// Returns whether two trees over the same namespace have the same
/// topology, i.e. the same set of non-trivial splits. Splits are compared
/// as rooted only if both trees are rooted.
///
/// # Example
/// ```
/// use phylosplit::model::TaxonNamespace;
/// use phylosplit::newick;
/// use phylosplit::splits::same_topology;
///
/// let mut namespace = TaxonNamespace::new();
/// let a = newick::parse_tree("((A,B),(C,D));", &mut namespace).unwrap();
/// let b = newick::parse_tree("(A,B,(C,D));", &mut namespace).unwrap();
/// let c = newick::parse_tree("((A,C),(B,D));", &mut namespace).unwrap();
///
/// assert!(same_topology(&a, &b, &namespace));
/// assert!(!same_topology(&a, &c, &namespace));
/// ```
pub fn same_topology(a: &Tree, b: &Tree, namespace: &TaxonNamespace) -> bool {
    let rooted = a.is_rooted() && b.is_rooted();
    tree_splits(a, namespace, rooted) == tree_splits(b, namespace, rooted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick;

    #[test]
    fn test_normalize_width_zero() {
        let empty = Bitmask::zeros(0);
        assert_eq!(normalize(&empty), empty);
        assert!(is_normalized(&empty));
    }

    #[test]
    fn test_parse_group_errors() {
        assert!(matches!(
            parse_group_to_mask("**.", 4, false),
            Err(PhyloError::DimensionMismatch { expected: 4, found: 3 })
        ));
        assert!(matches!(
            parse_group_to_mask("*. x.", 4, false),
            Err(PhyloError::InvalidSplitSymbol { symbol: 'x', position: 2 })
        ));
        assert!(matches!(
            parse_group_to_mask("*****", 4, false),
            Err(PhyloError::DimensionMismatch { expected: 4, found: 5 })
        ));
    }

    #[test]
    fn test_trivial_groups_are_not_errors() {
        assert!(parse_group_to_mask("....", 4, true).unwrap().is_trivial());
        assert!(parse_group_to_mask("****", 4, false).unwrap().is_trivial());
    }

    #[test]
    fn test_tree_bitmasks() {
        let mut namespace = TaxonNamespace::new();
        let tree = newick::parse_tree("((A,B),(C,D));", &mut namespace).unwrap();
        let masks = tree_bitmasks(&tree, &namespace);
        let root = tree.root_index().unwrap();

        assert_eq!(masks[root], Some(Bitmask::ones(4)));
        let cd = tree.node(root).children()[1];
        assert_eq!(masks[cd], Some(Bitmask::from_u64(0b1100, 4)));
        // Raw masks, the normalized edge split of {C,D} is {A,B}
        assert_eq!(edge_to_bitmask(&tree, cd, &namespace), Bitmask::from_u64(0b0011, 4));
    }

    #[test]
    fn test_rooted_edges_are_not_normalized() {
        let mut namespace = TaxonNamespace::new();
        let tree = newick::parse_tree("[&R] (A,(B,C));", &mut namespace).unwrap();
        let bc = tree.node(tree.root_index().unwrap()).children()[1];
        assert_eq!(edge_to_bitmask(&tree, bc, &namespace), Bitmask::from_u64(0b110, 3));
    }

    #[test]
    fn test_tree_splits_skip_root_and_trivial() {
        let mut namespace = TaxonNamespace::new();
        let tree = newick::parse_tree("((A,B),(C,D));", &mut namespace).unwrap();

        let unrooted = tree_splits(&tree, &namespace, false);
        // Four leaf splits and {A,B}|{C,D} once
        assert_eq!(unrooted.len(), 5);
        assert!(unrooted.contains(&Bitmask::from_u64(0b0011, 4)));

        let rooted = tree_splits(&tree, &namespace, true);
        assert_eq!(rooted.len(), 6);
    }

    #[test]
    fn test_same_topology_with_rooting() {
        let mut namespace = TaxonNamespace::new();
        let a = newick::parse_tree("[&R] ((A,B),(C,D));", &mut namespace).unwrap();
        let b = newick::parse_tree("[&R] (A,(B,(C,D)));", &mut namespace).unwrap();
        let c = newick::parse_tree("[&U] (A,(B,(C,D)));", &mut namespace).unwrap();

        assert!(!same_topology(&a, &b, &namespace));
        assert!(same_topology(&a, &c, &namespace));
    }
}
