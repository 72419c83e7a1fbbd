//! Datasets: ordered trees blocks bound to taxon namespaces.

use crate::error::{PhyloError, Result};
use crate::model::taxon_namespace::{NamespaceMark, TaxonNamespace};
use crate::model::tree::Tree;
use log::debug;

/// Index of a namespace within its [Dataset].
pub type NamespaceIndex = usize;

// =#========================================================================#=
// TREES BLOCK
// =#========================================================================#=
/// An ordered list of trees over one taxon namespace of a [Dataset].
#[derive(Debug, Clone, PartialEq)]
pub struct TreesBlock {
    title: Option<String>,
    namespace: NamespaceIndex,
    trees: Vec<Tree>,
}

impl TreesBlock {
    /// Creates an empty block bound to the given dataset namespace.
    pub fn new(namespace: NamespaceIndex) -> Self {
        TreesBlock {
            title: None,
            namespace,
            trees: Vec::new(),
        }
    }

    /// Returns the title of the block (Nexus `TITLE`, NeXML `label`).
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Sets the title of the block.
    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    /// Returns the index of the namespace this block is bound to.
    pub fn namespace(&self) -> NamespaceIndex {
        self.namespace
    }

    /// Returns the trees of this block.
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Appends a tree.
    pub fn push(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    /// Returns the number of trees.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Returns whether the block holds no trees.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

impl std::ops::Index<usize> for TreesBlock {
    type Output = Tree;

    fn index(&self, index: usize) -> &Self::Output {
        &self.trees[index]
    }
}

// =#========================================================================#=
// DATASET
// =#========================================================================#=
/// A collection of taxon namespaces and trees blocks bound to them.
///
/// Readers append to a dataset. By default every taxa declaration in a file
/// (a Nexus `TAXA` block, a NeXML `otus` element, a Newick file) creates a
/// new namespace. [attach_namespace](Self::attach_namespace) makes all later
/// reads bind to one namespace instead, so that bit positions stay stable
/// across files.
///
/// # Example
/// ```
/// use phylosplit::format::{DatasetFormat, NewickFormat};
/// use phylosplit::model::Dataset;
///
/// let mut dataset = Dataset::new();
/// let taxa = dataset.add_namespace(Default::default());
/// dataset.attach_namespace(taxa).unwrap();
///
/// NewickFormat.read_str_into("((A,B),C);", &mut dataset).unwrap();
/// NewickFormat.read_str_into("((C,B),D);", &mut dataset).unwrap();
///
/// assert_eq!(dataset.trees_blocks().len(), 2);
/// assert_eq!(dataset.namespace(taxa).labels(), &["A", "B", "C", "D"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    namespaces: Vec<TaxonNamespace>,
    trees_blocks: Vec<TreesBlock>,
    attached: Option<NamespaceIndex>,
}

/// Snapshot of a dataset taken before a read that may fail.
#[derive(Debug, Clone)]
pub struct DatasetMark {
    num_namespaces: usize,
    num_trees_blocks: usize,
    namespace_marks: Vec<NamespaceMark>,
}

impl Dataset {
    /// Creates an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dataset holding a single tree over the given namespace.
    pub fn from_tree(tree: Tree, namespace: TaxonNamespace) -> Self {
        let mut dataset = Self::new();
        let index = dataset.add_namespace(namespace);
        dataset.add_trees_block(index).push(tree);
        dataset
    }

    /// Adds a namespace and returns its index.
    pub fn add_namespace(&mut self, namespace: TaxonNamespace) -> NamespaceIndex {
        self.namespaces.push(namespace);
        self.namespaces.len() - 1
    }

    /// Returns the namespace at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn namespace(&self, index: NamespaceIndex) -> &TaxonNamespace {
        &self.namespaces[index]
    }

    /// Returns the namespace at `index` for modification.
    pub fn namespace_mut(&mut self, index: NamespaceIndex) -> &mut TaxonNamespace {
        &mut self.namespaces[index]
    }

    /// Returns all namespaces.
    pub fn namespaces(&self) -> &[TaxonNamespace] {
        &self.namespaces
    }

    /// Makes every subsequent read bind its taxa to the given namespace.
    ///
    /// # Errors
    /// Returns [PhyloError::UnknownNamespace] if there is no namespace at
    /// `index`; the previous attachment is kept.
    pub fn attach_namespace(&mut self, index: NamespaceIndex) -> Result<()> {
        if index >= self.namespaces.len() {
            return Err(PhyloError::UnknownNamespace {
                index,
                count: self.namespaces.len(),
            });
        }
        debug!("Attaching namespace {index} for subsequent reads");
        self.attached = Some(index);
        Ok(())
    }

    /// Reverts to creating a namespace per taxa declaration.
    pub fn detach_namespace(&mut self) {
        self.attached = None;
    }

    /// Returns the attached namespace, if any.
    pub fn attached_namespace(&self) -> Option<NamespaceIndex> {
        self.attached
    }

    /// Returns the attached namespace or adds a new empty one.
    ///
    /// An attached index is always in bounds: attaching checks it and
    /// [rollback](Self::rollback) detaches namespaces it removes.
    pub fn namespace_for_read(&mut self) -> NamespaceIndex {
        match self.attached {
            Some(index) => index,
            None => self.add_namespace(TaxonNamespace::new()),
        }
    }

    /// Adds an empty trees block bound to the namespace at `namespace`.
    pub fn add_trees_block(&mut self, namespace: NamespaceIndex) -> &mut TreesBlock {
        self.trees_blocks.push(TreesBlock::new(namespace));
        let last = self.trees_blocks.len() - 1;
        &mut self.trees_blocks[last]
    }

    /// Returns all trees blocks.
    pub fn trees_blocks(&self) -> &[TreesBlock] {
        &self.trees_blocks
    }

    /// Returns the trees block at `index`.
    pub fn trees_block(&self, index: usize) -> Option<&TreesBlock> {
        self.trees_blocks.get(index)
    }

    /// Iterates over every tree together with the namespace it is bound to.
    pub fn trees(&self) -> impl Iterator<Item = (&Tree, &TaxonNamespace)> {
        self.trees_blocks.iter().flat_map(move |block| {
            let namespace = &self.namespaces[block.namespace];
            block.trees.iter().map(move |tree| (tree, namespace))
        })
    }

    /// Returns the total number of trees over all blocks.
    pub fn num_trees(&self) -> usize {
        self.trees_blocks.iter().map(TreesBlock::len).sum()
    }

    /// Remembers the current contents, see [rollback](Self::rollback).
    pub fn mark(&self) -> DatasetMark {
        DatasetMark {
            num_namespaces: self.namespaces.len(),
            num_trees_blocks: self.trees_blocks.len(),
            namespace_marks: self.namespaces.iter().map(TaxonNamespace::mark).collect(),
        }
    }

    /// Removes everything added after `mark` was taken: trees blocks,
    /// namespaces, and taxa appended to older namespaces.
    pub fn rollback(&mut self, mark: DatasetMark) {
        self.trees_blocks.truncate(mark.num_trees_blocks);
        self.namespaces.truncate(mark.num_namespaces);
        for (namespace, namespace_mark) in self.namespaces.iter_mut().zip(mark.namespace_marks) {
            namespace.rollback(namespace_mark);
        }
        if self.attached.is_some_and(|index| index >= self.namespaces.len()) {
            self.attached = None;
        }
    }
}
