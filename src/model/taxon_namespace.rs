//! Taxon namespace: the ordered registry of taxa shared by trees.
//!
//! The position of a taxon in its namespace is its bit position in every
//! split bitmask derived from trees bound to that namespace.

use crate::error::PhyloError;
use std::collections::HashMap;
use std::fmt;

/// Index of a taxon within its [TaxonNamespace].
pub type TaxonIndex = usize;

// =#========================================================================#=
// TAXON NAMESPACE
// =#========================================================================#=
/// Ordered, deduplicated collection of taxon labels.
///
/// Labels are registered on first encounter and keep their index forever:
/// the namespace only grows, and existing entries are never reordered. The
/// one exception is [rollback](Self::rollback) to a [NamespaceMark], which
/// parsers use to undo the registrations of a failed parse.
///
/// # Example
/// ```
/// use phylosplit::model::TaxonNamespace;
///
/// let mut taxa = TaxonNamespace::new();
///
/// let a = taxa.get_or_insert("A");  // 0
/// let b = taxa.get_or_insert("B");  // 1
/// let a2 = taxa.get_or_insert("A"); // 0 (deduplicated)
///
/// assert_eq!(a, a2);
/// assert_eq!(b, 1);
/// assert_eq!(taxa.label(a), Some("A"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonNamespace {
    /// Labels in registration order
    labels: Vec<String>,
    /// Map from label to its index
    map: HashMap<String, TaxonIndex>,
}

/// Snapshot of a namespace size, taken before a parse that may fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceMark(usize);

impl TaxonNamespace {
    /// Creates an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty namespace with room for `num_taxa` labels.
    pub fn with_capacity(num_taxa: usize) -> Self {
        TaxonNamespace {
            labels: Vec::with_capacity(num_taxa),
            map: HashMap::with_capacity(num_taxa),
        }
    }

    /// Creates a namespace from labels in order, skipping duplicates.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut namespace = Self::new();
        for label in labels {
            namespace.get_or_insert(label.as_ref());
        }
        namespace
    }

    /// Gets the index for a label, registering it if it doesn't exist yet.
    pub fn get_or_insert(&mut self, label: &str) -> TaxonIndex {
        if let Some(&index) = self.map.get(label) {
            return index;
        }

        let index = self.labels.len();
        self.labels.push(label.to_string());
        self.map.insert(label.to_string(), index);
        index
    }

    /// Retrieves the index for a given label, `None` if not registered.
    pub fn index_of(&self, label: &str) -> Option<TaxonIndex> {
        self.map.get(label).copied()
    }

    /// Retrieves the index for a given label.
    ///
    /// # Errors
    /// Returns [PhyloError::LabelMismatch] if the label is not registered.
    pub fn require(&self, label: &str) -> Result<TaxonIndex, PhyloError> {
        self.index_of(label).ok_or_else(|| PhyloError::LabelMismatch {
            label: label.to_string(),
            context: String::from("is not part of the taxon namespace"),
        })
    }

    /// Retrieves the label for a given index.
    pub fn label(&self, index: TaxonIndex) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Checks if a label is registered.
    pub fn contains_label(&self, label: &str) -> bool {
        self.map.contains_key(label)
    }

    /// Returns the number of taxa.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns whether no taxon is registered.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the labels in index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Iterates over `(index, label)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (TaxonIndex, &str)> {
        self.labels.iter().map(String::as_str).enumerate()
    }

    /// Remembers the current size, see [rollback](Self::rollback).
    pub fn mark(&self) -> NamespaceMark {
        NamespaceMark(self.labels.len())
    }

    /// Removes every taxon registered after `mark` was taken.
    pub fn rollback(&mut self, mark: NamespaceMark) {
        for label in self.labels.drain(mark.0.min(self.labels.len())..) {
            self.map.remove(&label);
        }
    }
}

impl fmt::Display for TaxonNamespace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "TaxonNamespace ({} taxa):", self.labels.len())?;
        for (index, label) in self.iter() {
            writeln!(f, "  [{index}] {label}")?;
        }
        Ok(())
    }
}

impl std::ops::Index<TaxonIndex> for TaxonNamespace {
    type Output = str;

    fn index(&self, index: TaxonIndex) -> &Self::Output {
        &self.labels[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollback_removes_late_registrations() {
        let mut taxa = TaxonNamespace::from_labels(["A", "B"]);
        let mark = taxa.mark();
        taxa.get_or_insert("C");
        taxa.get_or_insert("A");
        taxa.get_or_insert("D");
        assert_eq!(taxa.len(), 4);

        taxa.rollback(mark);
        assert_eq!(taxa.labels(), &["A", "B"]);
        assert!(!taxa.contains_label("C"));
        assert_eq!(taxa.get_or_insert("D"), 2);
    }

    #[test]
    fn test_require_unknown_label() {
        let taxa = TaxonNamespace::from_labels(["A"]);
        assert_eq!(taxa.require("A").unwrap(), 0);
        assert!(matches!(
            taxa.require("Z"),
            Err(PhyloError::LabelMismatch { label, .. }) if label == "Z"
        ));
    }
}
