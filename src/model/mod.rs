//! In-memory model of taxa, trees, and datasets.
//!
//! - [TaxonNamespace]: ordered registry of taxon labels; a taxon's index is
//!   its bit position in split bitmasks.
//! - [Tree]: arena of [Node]s referencing each other by [NodeIndex]; leaves
//!   reference taxa by [TaxonIndex], so many trees share one namespace.
//! - [Dataset]: namespaces plus [TreesBlock]s bound to them, the unit that
//!   readers produce and writers consume.

pub mod annotation;
pub mod dataset;
pub mod label_resolver;
pub mod node;
pub mod taxon_namespace;
pub mod tree;

pub use annotation::{AnnotationValue, Annotations};
pub use dataset::{Dataset, DatasetMark, NamespaceIndex, TreesBlock};
pub use label_resolver::LabelResolver;
pub use node::{BranchLength, Edge, Node, NodeIndex};
pub use taxon_namespace::{NamespaceMark, TaxonIndex, TaxonNamespace};
pub use tree::{PostOrderIter, PreOrderIter, Rooting, Tree};
