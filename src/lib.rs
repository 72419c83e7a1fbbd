//! Phylosplit is a library to read and write phylogenetic trees in NEWICK,
//! NEXUS and NeXML and to encode their edges as bipartitions (splits).
//!
//! Core functionality provided:
//! - Model: trees are arenas of [Node]s bound to a [TaxonNamespace], which
//!   maps taxon labels to stable bit positions. A [Dataset] groups
//!   namespaces and blocks of trees read from one or more sources.
//!   See [crate::model] for details.
//! - Formats: parsers and writers for [newick], [nexus] and [nexml]. Each
//!   implements [DatasetFormat], and [Format] selects one by name or file
//!   extension. Writing and re-reading a dataset reproduces it.
//! - Splits: [Bitmask] encoding of tree edges, normalization of unrooted
//!   splits, group strings and split frequencies over many trees
//!   ([SplitDistribution]). See [crate::splits].
//!
//! Limitations:
//! - NEXUS character, distance and other non-tree blocks are skipped
//! - NeXML character matrices and network elements are ignored
//!
//! The library logs through the [log] facade and installs no logger; see
//! [crate::metavar] for the environment variables it reads.
//!
//! # Example
//!
//! Read trees, share one namespace, count splits:
//! ```
//! use phylosplit::format::{DatasetFormat, Format};
//! use phylosplit::splits::SplitDistribution;
//!
//! let dataset = Format::Newick
//!     .handler()
//!     .read_dataset(&mut "((A,B),(C,D));\n((A,B),C,D);".as_bytes())
//!     .unwrap();
//!
//! let namespace = dataset.namespace(0);
//! let mut distribution = SplitDistribution::new(namespace.len(), false).without_leaf_splits();
//! for (tree, namespace) in dataset.trees() {
//!     distribution.count_splits_on_tree(tree, namespace).unwrap();
//! }
//! assert_eq!(distribution.total_trees_counted(), 2);
//! assert_eq!(distribution.sorted_splits()[0].1, 2);
//! ```
//!
//! Convert between formats:
//! ```no_run
//! use phylosplit::{read_dataset_file, write_dataset_file};
//!
//! let dataset = read_dataset_file("mcmc.trees", None)?;
//! write_dataset_file("mcmc.xml", &dataset, None)?;
//! # Ok::<(), phylosplit::PhyloError>(())
//! ```

pub mod error;
pub mod format;
pub mod metavar;
pub mod model;
pub mod newick;
pub mod nexml;
pub mod nexus;
pub mod parser;
pub mod splits;

pub use crate::error::{PhyloError, Result};
pub use crate::format::{DatasetFormat, Format, read_dataset_file, read_file_into, write_dataset_file};
pub use crate::model::{Dataset, Node, Rooting, TaxonNamespace, Tree};
pub use crate::splits::{Bitmask, SplitDistribution};

// ============================================================================
// Quick Newick API
// ============================================================================
/// Parses a single Newick string into a tree and a new namespace.
///
/// See [`newick::parse_tree`] for full documentation.
///
/// # Example
/// ```
/// let (tree, taxa) = phylosplit::parse_newick_str("((A:0.1,B:0.2):0.3,C:0.4);").unwrap();
/// assert_eq!(tree.num_leaves(), 3);
/// assert_eq!(taxa.labels(), &["A", "B", "C"]);
/// ```
pub fn parse_newick_str<S: AsRef<str>>(newick: S) -> Result<(Tree, TaxonNamespace)> {
    let mut namespace = TaxonNamespace::new();
    let tree = newick::parse_tree(newick, &mut namespace)?;
    Ok((tree, namespace))
}

// ============================================================================
// Quick Nexus API
// ============================================================================
/// Parses a NEXUS file into a dataset.
///
/// See [`nexus::parse_file`] for full documentation.
pub fn parse_nexus_file<P: AsRef<std::path::Path>>(path: P) -> Result<Dataset> {
    nexus::parse_file(path)
}
