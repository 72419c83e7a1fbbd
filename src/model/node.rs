//! Node and edge types of the tree arena.

use crate::model::annotation::Annotations;
use crate::model::taxon_namespace::TaxonIndex;
use std::fmt;
use std::ops::Deref;

/// Index of a node in its tree's arena.
pub type NodeIndex = usize;

// =#========================================================================#=
// BRANCH LENGTH
// =#========================================================================#=
/// Length of an edge: a finite real number.
///
/// Negative values are accepted, as produced by distance methods such as
/// neighbour joining. Formatting uses the shortest representation that
/// reads back to the same value, so lengths survive write/read cycles.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct BranchLength(f64);

impl BranchLength {
    /// Creates a new branch length.
    ///
    /// # Returns
    /// `None` if `value` is NaN or infinite.
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(BranchLength(value))
    }

    /// Returns the raw value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Deref for BranchLength {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for BranchLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =#========================================================================#=
// EDGE
// =#========================================================================#=
/// The edge connecting a node to its parent.
///
/// The root's edge has no parent end but may still carry a length (a Newick
/// `(A,B):0.1;` root branch).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edge {
    /// Length of the edge, absent if the input gave none
    pub length: Option<BranchLength>,
}

impl Edge {
    /// Creates an edge with the given (optional) length.
    pub fn new(length: Option<BranchLength>) -> Self {
        Edge { length }
    }
}

// =#========================================================================#=
// NODE
// =#========================================================================#=
/// A node of a phylogenetic tree.
///
/// A node is a **leaf** if it has no children; leaves carry a taxon. Internal
/// nodes may carry a free-text label (e.g. a support value). Each node owns
/// the [Edge] to its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    index: NodeIndex,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
    taxon: Option<TaxonIndex>,
    label: Option<String>,
    edge: Edge,
    annotations: Annotations,
}

impl Node {
    pub(crate) fn new(index: NodeIndex, children: Vec<NodeIndex>, taxon: Option<TaxonIndex>, edge: Edge) -> Self {
        Node {
            index,
            parent: None,
            children,
            taxon,
            label: None,
            edge,
            annotations: Annotations::new(),
        }
    }

    /// Returns the index of this node in the tree arena.
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    /// Returns the parent index; `None` for the root.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: NodeIndex) {
        self.parent = Some(parent);
    }

    /// Returns the ordered child indices.
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// Returns whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns whether this node has children.
    pub fn is_internal(&self) -> bool {
        !self.children.is_empty()
    }

    /// Returns the taxon of this node (set for leaves).
    pub fn taxon(&self) -> Option<TaxonIndex> {
        self.taxon
    }

    /// Returns the free-text label of this node.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets the free-text label of this node.
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// Returns the edge to the parent.
    pub fn edge(&self) -> &Edge {
        &self.edge
    }

    /// Returns the length of the edge to the parent.
    pub fn branch_length(&self) -> Option<BranchLength> {
        self.edge.length
    }

    /// Sets the length of the edge to the parent.
    pub fn set_branch_length(&mut self, length: Option<BranchLength>) {
        self.edge.length = length;
    }

    /// Returns the annotations of this node.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Returns the annotations of this node for modification.
    pub fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }

    pub(crate) fn set_annotations(&mut self, annotations: Annotations) {
        self.annotations = annotations;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_length_rejects_non_finite() {
        assert!(BranchLength::new(f64::NAN).is_none());
        assert!(BranchLength::new(f64::INFINITY).is_none());
        assert_eq!(*BranchLength::new(-0.25).unwrap(), -0.25);
    }

    #[test]
    fn test_branch_length_display_is_shortest() {
        assert_eq!(BranchLength::new(1.0).unwrap().to_string(), "1");
        assert_eq!(BranchLength::new(0.1).unwrap().to_string(), "0.1");
        assert_eq!(BranchLength::new(1e-7).unwrap().to_string(), "0.0000001");
    }
}
