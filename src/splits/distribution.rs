//! Split frequencies over a collection of trees.

use crate::error::{PhyloError, Result};
use crate::model::taxon_namespace::TaxonNamespace;
use crate::model::tree::Tree;
use crate::splits::bitmask::Bitmask;
use crate::splits::encoding::{normalize, tree_bitmasks};
use log::trace;
use std::collections::HashMap;

/// Summed edge lengths of one split.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct LengthSum {
    sum: f64,
    count: usize,
}

// =#========================================================================#=
// SPLIT DISTRIBUTION
// =#========================================================================#=
/// Counts how many trees contain each split.
///
/// All trees counted must be bound to a namespace of size `width`. Unless
/// the distribution is rooted, splits are [normalize]d before counting, so
/// a split and its complement are the same key. Each split is counted at
/// most once per tree; trivial splits and the edge above the root are never
/// counted.
///
/// # Example
/// ```
/// use phylosplit::model::TaxonNamespace;
/// use phylosplit::newick;
/// use phylosplit::splits::{Bitmask, SplitDistribution};
///
/// let mut namespace = TaxonNamespace::new();
/// let trees = newick::parse_trees("((A,B),(C,D));((A,B),C,D);((A,C),(B,D));", &mut namespace).unwrap();
///
/// let mut distribution = SplitDistribution::new(namespace.len(), false).without_leaf_splits();
/// for tree in &trees {
///     distribution.count_splits_on_tree(tree, &namespace).unwrap();
/// }
///
/// let ab = Bitmask::from_u64(0b0011, 4);
/// assert_eq!(distribution.total_trees_counted(), 3);
/// assert_eq!(distribution.split_count(&ab), 2);
/// assert!((distribution.frequency(&ab) - 2.0 / 3.0).abs() < 1e-12);
/// assert_eq!(distribution.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDistribution {
    width: usize,
    is_rooted: bool,
    include_leaf_splits: bool,
    total_trees_counted: usize,
    split_counts: HashMap<Bitmask, usize>,
    edge_lengths: HashMap<Bitmask, LengthSum>,
}

impl SplitDistribution {
    /// Creates an empty distribution over `width` taxa. Leaf splits are
    /// counted unless [without_leaf_splits](Self::without_leaf_splits) is set.
    pub fn new(width: usize, is_rooted: bool) -> Self {
        SplitDistribution {
            width,
            is_rooted,
            include_leaf_splits: true,
            total_trees_counted: 0,
            split_counts: HashMap::new(),
            edge_lengths: HashMap::new(),
        }
    }

    /// Skips the splits of edges leading into leaves when counting trees.
    pub fn without_leaf_splits(mut self) -> Self {
        self.include_leaf_splits = false;
        self
    }

    /// Creates a distribution from a table of split counts over `total` trees.
    ///
    /// # Errors
    /// Returns [PhyloError::DimensionMismatch] for a split of another width
    /// and [PhyloError::InvalidSplitCount] for a count above `total`.
    pub fn from_counts<I>(counts: I, total: usize, width: usize, is_rooted: bool) -> Result<Self>
    where
        I: IntoIterator<Item = (Bitmask, usize)>,
    {
        let mut distribution = SplitDistribution::new(width, is_rooted);
        distribution.total_trees_counted = total;
        for (mask, count) in counts {
            distribution.add_split_count(&mask, count)?;
        }
        Ok(distribution)
    }
}

// ============================================================================
// Counting (pub)
// ============================================================================
impl SplitDistribution {
    /// Counts the splits of one tree and increments the tree total.
    ///
    /// Edges mapping to the same split, like the two root edges of an
    /// unrooted tree with a basal bifurcation, add up to one edge length.
    ///
    /// # Errors
    /// Returns [PhyloError::DimensionMismatch] if `namespace` does not have
    /// `width` taxa, or [PhyloError::InvalidTree] if the tree is invalid
    /// against it. The distribution is unchanged on error.
    pub fn count_splits_on_tree(&mut self, tree: &Tree, namespace: &TaxonNamespace) -> Result<()> {
        if namespace.len() != self.width {
            return Err(PhyloError::DimensionMismatch { expected: self.width, found: namespace.len() });
        }
        tree.validate_against(namespace)?;

        let root = tree.root_index();
        let mut lengths: HashMap<Bitmask, Option<f64>> = HashMap::new();
        for (index, mask) in tree_bitmasks(tree, namespace).into_iter().enumerate() {
            let Some(mask) = mask else { continue };
            let node = tree.node(index);
            if Some(index) == root || (node.is_leaf() && !self.include_leaf_splits) {
                continue;
            }
            let split = self.key(&mask);
            if split.is_trivial() {
                continue;
            }

            let length = node.branch_length().map(|length| length.value());
            let entry = lengths.entry(split).or_insert(None);
            if let Some(length) = length {
                *entry = Some(entry.unwrap_or(0.0) + length);
            }
        }

        trace!("Counting {} splits on tree {}", lengths.len(), self.total_trees_counted + 1);
        for (split, length) in lengths {
            if let Some(length) = length {
                let sum = self.edge_lengths.entry(split.clone()).or_default();
                sum.sum += length;
                sum.count += 1;
            }
            *self.split_counts.entry(split).or_insert(0) += 1;
        }
        self.total_trees_counted += 1;

        Ok(())
    }

    /// Adds `count` occurrences of a split, without changing the tree total.
    /// A count of zero leaves the distribution unchanged.
    ///
    /// # Errors
    /// Returns [PhyloError::DimensionMismatch] if the width of `mask` differs
    /// and [PhyloError::InvalidSplitCount] if the resulting count would
    /// exceed the number of trees counted. The distribution is unchanged on
    /// error.
    pub fn add_split_count(&mut self, mask: &Bitmask, count: usize) -> Result<()> {
        if mask.width() != self.width {
            return Err(PhyloError::DimensionMismatch { expected: self.width, found: mask.width() });
        }
        if count == 0 {
            return Ok(());
        }

        let split = self.key(mask);
        let new_count = self.split_count(&split) + count;
        if new_count > self.total_trees_counted {
            return Err(PhyloError::InvalidSplitCount { count: new_count, total: self.total_trees_counted });
        }
        self.split_counts.insert(split, new_count);
        Ok(())
    }

    fn key(&self, mask: &Bitmask) -> Bitmask {
        if self.is_rooted { mask.clone() } else { normalize(mask) }
    }
}

// ============================================================================
// Getters & Properties
// ============================================================================
impl SplitDistribution {
    /// Returns the number of taxa of the splits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns whether splits are counted as rooted (not normalized).
    pub fn is_rooted(&self) -> bool {
        self.is_rooted
    }

    /// Returns the number of trees the counts are based on.
    pub fn total_trees_counted(&self) -> usize {
        self.total_trees_counted
    }

    /// Returns the count of every split seen.
    pub fn split_counts(&self) -> &HashMap<Bitmask, usize> {
        &self.split_counts
    }

    /// Returns the count of a split, 0 if never seen. Unrooted distributions
    /// normalize `mask` first.
    pub fn split_count(&self, mask: &Bitmask) -> usize {
        self.split_counts.get(&self.key(mask)).copied().unwrap_or(0)
    }

    /// Returns the frequency (count / total trees) of every split seen.
    pub fn split_frequencies(&self) -> HashMap<Bitmask, f64> {
        self.split_counts
            .keys()
            .map(|split| (split.clone(), self.frequency(split)))
            .collect()
    }

    /// Returns the frequency of a split, 0.0 if no trees were counted.
    pub fn frequency(&self, mask: &Bitmask) -> f64 {
        if self.total_trees_counted == 0 {
            return 0.0;
        }
        self.split_count(mask) as f64 / self.total_trees_counted as f64
    }

    /// Returns the mean length of the edges with this split, over the trees
    /// in which the edge had a length.
    pub fn mean_edge_length(&self, mask: &Bitmask) -> Option<f64> {
        self.edge_lengths
            .get(&self.key(mask))
            .filter(|lengths| lengths.count > 0)
            .map(|lengths| lengths.sum / lengths.count as f64)
    }

    /// Returns the splits sorted by decreasing count, ties in ascending
    /// mask order.
    pub fn sorted_splits(&self) -> Vec<(&Bitmask, usize)> {
        let mut splits: Vec<(&Bitmask, usize)> = self.split_counts.iter().map(|(mask, &count)| (mask, count)).collect();
        splits.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        splits
    }

    /// Returns the number of distinct splits.
    pub fn len(&self) -> usize {
        self.split_counts.len()
    }

    /// Returns whether no split was counted.
    pub fn is_empty(&self) -> bool {
        self.split_counts.is_empty()
    }
}
