//! Bipartition (split) encoding of tree edges.
//!
//! Removing an edge from a tree separates its taxa into two groups. A split
//! records that separation as [Bitmask] over the taxon namespace: bit *i*
//! is set if taxon *i* lies below the edge. Bit positions are namespace
//! indices, so splits of different trees are only comparable when the
//! trees share one namespace (see
//! [Dataset::attach_namespace](crate::model::Dataset::attach_namespace)).
//!
//! An unrooted tree cannot tell a group from its complement, so its splits
//! are [normalize]d to the form containing taxon 0. Splits of rooted trees
//! keep their direction.
//!
//! # Example
//! ```
//! use phylosplit::model::TaxonNamespace;
//! use phylosplit::newick;
//! use phylosplit::splits::{parse_group_to_mask, split_as_string, SplitDistribution};
//!
//! let mut namespace = TaxonNamespace::new();
//! let tree = newick::parse_tree("(A,(B,C));", &mut namespace).unwrap();
//!
//! let mut distribution = SplitDistribution::new(namespace.len(), false).without_leaf_splits();
//! distribution.count_splits_on_tree(&tree, &namespace).unwrap();
//!
//! // {B,C} is normalized to its complement {A}
//! let (split, count) = distribution.sorted_splits()[0];
//! assert_eq!(split.to_u64(), Some(1));
//! assert_eq!(count, 1);
//! assert_eq!(split_as_string(split, '.', '*'), "..*");
//! assert_eq!(parse_group_to_mask(".**", 3, true).unwrap(), *split);
//! ```

pub mod bitmask;
pub mod distribution;
pub mod encoding;

pub use self::bitmask::Bitmask;
pub use self::distribution::SplitDistribution;
pub use self::encoding::{
    edge_to_bitmask, is_normalized, normalize, parse_group_to_mask, same_topology, split_as_string, tree_bitmasks,
    tree_splits,
};
