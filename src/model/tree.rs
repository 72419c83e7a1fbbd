//! Tree module for phylogenetic tree representation.
//!
//! This module provides [Tree], an n-ary tree stored in an arena of [Node]s
//! addressed by [NodeIndex], together with its [Rooting] state and the
//! pre-order and post-order iterators.

use crate::error::PhyloError;
use crate::model::node::{BranchLength, Edge, Node, NodeIndex};
use crate::model::taxon_namespace::{TaxonIndex, TaxonNamespace};

// =#========================================================================#=
// ROOTING
// =#========================================================================#=
/// Whether a tree is to be interpreted as rooted.
///
/// Files state rooting with the `[&R]` / `[&U]` comments; trees without such
/// a statement are [Unknown](Rooting::Unknown) and are treated as unrooted
/// wherever the difference matters (split encoding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rooting {
    /// `[&R]`: splits are directional
    Rooted,
    /// `[&U]`: splits are normalized
    Unrooted,
    /// No rooting statement
    #[default]
    Unknown,
}

impl Rooting {
    /// Returns `true` only for [Rooting::Rooted].
    pub fn is_rooted(self) -> bool {
        self == Rooting::Rooted
    }

    /// Returns the rooting comment used in Newick and Nexus files.
    pub fn token(self) -> Option<&'static str> {
        match self {
            Rooting::Rooted => Some("[&R]"),
            Rooting::Unrooted => Some("[&U]"),
            Rooting::Unknown => None,
        }
    }
}

// =#========================================================================#=
// TREE
// =#========================================================================#=
/// A phylogenetic tree with arena-allocated nodes.
///
/// Nodes are stored in a vector and reference each other via indices,
/// avoiding the complexity of pointer-based trees in Rust. Leaves reference
/// their taxon by [TaxonIndex] into the [TaxonNamespace] the tree is bound to
/// (for parsed trees, the namespace of its [TreesBlock](crate::model::TreesBlock)).
///
/// # Construction
/// Bottom-up: add leaves, then internal nodes over already added children,
/// and finally set the root.
///
/// ```
/// use phylosplit::model::{BranchLength, Rooting, TaxonNamespace, Tree};
///
/// let mut taxa = TaxonNamespace::new();
/// let mut tree = Tree::new().with_rooting(Rooting::Rooted);
/// let a = tree.add_leaf(taxa.get_or_insert("A"), BranchLength::new(1.0));
/// let b = tree.add_leaf(taxa.get_or_insert("B"), BranchLength::new(1.0));
/// let c = tree.add_leaf(taxa.get_or_insert("C"), BranchLength::new(2.0));
/// let ab = tree.add_internal(vec![a, b], BranchLength::new(1.0));
/// let root = tree.add_internal(vec![ab, c], None);
/// tree.set_root(root);
///
/// assert!(tree.is_valid());
/// assert_eq!(tree.num_leaves(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeIndex>,
    name: Option<String>,
    rooting: Rooting,
}

// ============================================================================
// Construction
// ============================================================================
impl Tree {
    /// Creates a new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty tree with room for `num_nodes` nodes.
    pub fn with_capacity(num_nodes: usize) -> Self {
        Tree {
            nodes: Vec::with_capacity(num_nodes),
            ..Self::default()
        }
    }

    /// Sets the name of the tree.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the rooting state of the tree.
    pub fn with_rooting(mut self, rooting: Rooting) -> Self {
        self.rooting = rooting;
        self
    }

    /// Adds a leaf for the given taxon and returns its index.
    pub fn add_leaf(&mut self, taxon: TaxonIndex, branch_length: Option<BranchLength>) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(Node::new(index, Vec::new(), Some(taxon), Edge::new(branch_length)));
        index
    }

    /// Adds an internal node over the given, already added children and
    /// returns its index. The children's parent is set to the new node.
    ///
    /// # Panics
    /// Panics if a child index is out of bounds.
    pub fn add_internal(&mut self, children: Vec<NodeIndex>, branch_length: Option<BranchLength>) -> NodeIndex {
        let index = self.nodes.len();
        for &child in &children {
            self.nodes[child].set_parent(index);
        }
        self.nodes.push(Node::new(index, children, None, Edge::new(branch_length)));
        index
    }

    /// Designates the root node.
    pub fn set_root(&mut self, index: NodeIndex) {
        self.root = Some(index);
    }

    /// Sets the name of the tree.
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Sets the rooting state of the tree.
    pub fn set_rooting(&mut self, rooting: Rooting) {
        self.rooting = rooting;
    }
}

// ============================================================================
// Validation
// ============================================================================
impl Tree {
    /// Validates the tree structure and all index references.
    ///
    /// Checks:
    /// - Root index is set, valid, and the root has no parent
    /// - All node indices match their position in the arena
    /// - All child indices are valid and point back to the correct parent
    /// - Every node is reached exactly once from the root
    /// - Every leaf has a taxon
    pub fn is_valid(&self) -> bool {
        self.structure_error().is_none()
    }

    /// Validates the tree against the namespace it is bound to: the
    /// structure (see [is_valid](Self::is_valid)), every taxon index in
    /// range, and no taxon on more than one leaf.
    ///
    /// # Errors
    /// Returns [PhyloError::InvalidTree] describing the first violation.
    pub fn validate_against(&self, namespace: &TaxonNamespace) -> Result<(), PhyloError> {
        if let Some(msg) = self.structure_error() {
            return Err(PhyloError::InvalidTree(msg));
        }

        let mut seen = vec![false; namespace.len()];
        for taxon in self.leaf_taxa() {
            match seen.get_mut(taxon) {
                None => {
                    return Err(PhyloError::InvalidTree(format!(
                        "taxon index {taxon} outside namespace of {} taxa",
                        namespace.len()
                    )));
                }
                Some(true) => {
                    return Err(PhyloError::InvalidTree(format!(
                        "taxon '{}' occurs on more than one leaf",
                        &namespace[taxon]
                    )));
                }
                Some(flag) => *flag = true,
            }
        }

        Ok(())
    }

    fn structure_error(&self) -> Option<String> {
        let root = match self.root {
            Some(root) if root < self.nodes.len() => root,
            Some(root) => return Some(format!("root index {root} out of bounds")),
            None => return Some(String::from("root not set")),
        };
        if self.nodes[root].parent().is_some() {
            return Some(String::from("root has a parent"));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if node.index() != index {
                return Some(format!("node at {index} has index {}", node.index()));
            }
            if node.is_leaf() && node.taxon().is_none() {
                return Some(format!("leaf {index} has no taxon"));
            }
            for &child in node.children() {
                if child >= self.nodes.len() {
                    return Some(format!("child index {child} out of bounds"));
                }
                if self.nodes[child].parent() != Some(index) {
                    return Some(format!("child {child} does not point back to {index}"));
                }
            }
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            if visited[index] {
                return Some(format!("node {index} reached twice"));
            }
            visited[index] = true;
            stack.extend_from_slice(self.nodes[index].children());
        }
        if let Some(unreached) = visited.iter().position(|v| !v) {
            return Some(format!("node {unreached} not reachable from root"));
        }

        None
    }
}

// ============================================================================
// Getters & Properties
// ============================================================================
impl Tree {
    /// Returns the name of this tree, or `None` if not set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the rooting state of this tree.
    pub fn rooting(&self) -> Rooting {
        self.rooting
    }

    /// Returns whether this tree is explicitly rooted.
    pub fn is_rooted(&self) -> bool {
        self.rooting.is_rooted()
    }

    /// Returns the root index, `None` while under construction.
    pub fn root_index(&self) -> Option<NodeIndex> {
        self.root
    }

    /// Returns the root node, `None` while under construction.
    pub fn root(&self) -> Option<&Node> {
        self.root.and_then(|root| self.nodes.get(root))
    }

    /// Returns the node at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index]
    }

    /// Returns the node at `index` for modification.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn node_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.nodes[index]
    }

    /// Returns all nodes in arena order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of leaves.
    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Returns the number of internal nodes (including the root).
    pub fn num_internal(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_internal()).count()
    }

    /// Iterates over the leaves in pre-order.
    pub fn leaves(&self) -> impl Iterator<Item = &Node> {
        self.pre_order_iter().filter(|n| n.is_leaf())
    }

    /// Returns the taxa of all leaves in pre-order.
    pub fn leaf_taxa(&self) -> Vec<TaxonIndex> {
        self.leaves().filter_map(Node::taxon).collect()
    }

    /// Returns whether every non-root node has a branch length.
    pub fn has_branch_lengths(&self) -> bool {
        self.nodes
            .iter()
            .filter(|n| Some(n.index()) != self.root)
            .all(|n| n.branch_length().is_some())
    }

    /// Returns the sum of all branch lengths (missing lengths count as zero).
    pub fn total_branch_length(&self) -> f64 {
        self.nodes
            .iter()
            .filter_map(|n| n.branch_length())
            .map(|length| *length)
            .sum()
    }

    /// Returns an iterator over the tree in post-order (children before parents).
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }

    /// Returns an iterator over the tree in pre-order (parents before
    /// children, children in their stored order).
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }
}

impl std::ops::Index<NodeIndex> for Tree {
    type Output = Node;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index]
    }
}

impl std::ops::IndexMut<NodeIndex> for Tree {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        &mut self.nodes[index]
    }
}

// =#========================================================================#=
// ITERATORS
// =#========================================================================#=
/// Iterator for post-order traversal (children before parents).
///
/// Stack-based, so deep trees do not overflow the call stack.
pub struct PostOrderIter<'a> {
    tree: &'a Tree,
    stack: Vec<(NodeIndex, bool)>, // (index, children_visited)
}

impl<'a> PostOrderIter<'a> {
    fn new(tree: &'a Tree) -> Self {
        let stack = tree.root.map(|root| vec![(root, false)]).unwrap_or_default();
        PostOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, children_visited)) = self.stack.pop() {
            let node = &self.tree[index];

            if children_visited || node.is_leaf() {
                return Some(node);
            }

            self.stack.push((index, true));
            // Reversed, so that the first child is processed first
            for &child in node.children().iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}

/// Iterator for pre-order traversal (parents before children).
pub struct PreOrderIter<'a> {
    tree: &'a Tree,
    stack: Vec<NodeIndex>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a Tree) -> Self {
        let stack = tree.root.map(|root| vec![root]).unwrap_or_default();
        PreOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let node = &self.tree[index];
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
