//! Arbitrary-width bit sets over the taxa of a namespace.

use crate::model::taxon_namespace::TaxonIndex;
use fixedbitset::FixedBitSet;
use std::fmt;

// =#========================================================================#=
// BITMASK
// =#========================================================================#=
/// A set of taxa as bit set: bit *i* stands for the taxon with index *i*
/// in a [TaxonNamespace](crate::model::TaxonNamespace), and the width is
/// the size of that namespace.
///
/// Two bitmasks are equal if they have the same width and the same bits set.
///
/// # Example
/// ```
/// use phylosplit::splits::Bitmask;
///
/// let mut mask = Bitmask::zeros(5);
/// mask.insert(1);
/// mask.insert(2);
/// assert_eq!(mask.to_u64(), Some(0b00110));
/// assert_eq!(mask.complement().to_u64(), Some(0b11001));
/// assert_eq!(mask.to_string(), "..**.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Bitmask(FixedBitSet);

impl Bitmask {
    /// Creates a bitmask of the given width with no bit set.
    pub fn zeros(width: usize) -> Self {
        Bitmask(FixedBitSet::with_capacity(width))
    }

    /// Creates a bitmask of the given width with all bits set.
    pub fn ones(width: usize) -> Self {
        let mut bits = FixedBitSet::with_capacity(width);
        bits.insert_range(..);
        Bitmask(bits)
    }

    /// Creates a bitmask with the given taxa set.
    ///
    /// # Panics
    /// Panics if a taxon index is not below `width`.
    pub fn from_taxa<I: IntoIterator<Item = TaxonIndex>>(width: usize, taxa: I) -> Self {
        let mut mask = Self::zeros(width);
        for taxon in taxa {
            mask.insert(taxon);
        }
        mask
    }

    /// Creates a bitmask of the given width from the low bits of `value`;
    /// bits at or above `width` are ignored.
    pub fn from_u64(value: u64, width: usize) -> Self {
        let mut mask = Self::zeros(width);
        for bit in 0..width.min(64) {
            if value >> bit & 1 == 1 {
                mask.insert(bit);
            }
        }
        mask
    }

    /// Returns the value of the bitmask as integer, or `None` if a bit at
    /// position 64 or above is set.
    pub fn to_u64(&self) -> Option<u64> {
        let mut value = 0u64;
        for bit in self.0.ones() {
            if bit >= 64 {
                return None;
            }
            value |= 1 << bit;
        }
        Some(value)
    }

    /// Returns the number of taxa the bitmask ranges over.
    pub fn width(&self) -> usize {
        self.0.len()
    }

    /// Sets the bit of a taxon.
    ///
    /// # Panics
    /// Panics if `taxon` is not below the width.
    pub fn insert(&mut self, taxon: TaxonIndex) {
        self.0.insert(taxon);
    }

    /// Sets the bit of a taxon to `value`.
    pub fn set(&mut self, taxon: TaxonIndex, value: bool) {
        self.0.set(taxon, value);
    }

    /// Returns whether the bit of a taxon is set; `false` for taxa beyond the width.
    pub fn contains(&self, taxon: TaxonIndex) -> bool {
        self.0.contains(taxon)
    }

    /// Returns the number of set bits.
    pub fn count_ones(&self) -> usize {
        self.0.count_ones(..)
    }

    /// Returns whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_clear()
    }

    /// Returns whether all bits are set.
    pub fn is_full(&self) -> bool {
        self.count_ones() == self.width()
    }

    /// Returns whether the bitmask is trivial: all zero or all one.
    /// Trivial masks do not separate any taxa.
    pub fn is_trivial(&self) -> bool {
        self.is_empty() || self.is_full()
    }

    /// Returns the complement within the width.
    pub fn complement(&self) -> Self {
        let mut bits = self.0.clone();
        bits.toggle_range(..);
        Bitmask(bits)
    }

    /// Sets all bits that are set in `other`.
    ///
    /// # Panics
    /// Panics if the widths differ.
    pub fn union_with(&mut self, other: &Bitmask) {
        assert_eq!(self.width(), other.width(), "bitmask widths differ");
        self.0.union_with(&other.0);
    }

    /// Returns whether all bits set in `self` are set in `other`.
    pub fn is_subset(&self, other: &Bitmask) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Iterates over the taxa whose bits are set, in increasing order.
    pub fn iter_ones(&self) -> impl Iterator<Item = TaxonIndex> + '_ {
        self.0.ones()
    }
}

/// Writes the mask with `*` for set and `.` for unset bits, most
/// significant taxon first (see [split_as_string](crate::splits::split_as_string)).
impl fmt::Display for Bitmask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for taxon in (0..self.width()).rev() {
            f.write_str(if self.contains(taxon) { "*" } else { "." })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_masks() {
        assert!(Bitmask::zeros(4).is_trivial());
        assert!(Bitmask::ones(4).is_trivial());
        assert!(!Bitmask::from_u64(0b0110, 4).is_trivial());
        assert!(Bitmask::zeros(0).is_trivial());
    }

    #[test]
    fn test_wide_mask() {
        let mut mask = Bitmask::zeros(130);
        mask.insert(0);
        mask.insert(129);
        assert_eq!(mask.count_ones(), 2);
        assert_eq!(mask.to_u64(), None);
        assert_eq!(mask.complement().count_ones(), 128);
        assert_eq!(mask.complement().complement(), mask);
    }

    #[test]
    fn test_union_and_subset() {
        let mut a = Bitmask::from_taxa(6, [0, 2]);
        let b = Bitmask::from_taxa(6, [2, 5]);
        a.union_with(&b);
        assert_eq!(a.iter_ones().collect::<Vec<_>>(), vec![0, 2, 5]);
        assert!(b.is_subset(&a));
    }

    #[test]
    fn test_equality_includes_width() {
        assert_ne!(Bitmask::from_u64(1, 3), Bitmask::from_u64(1, 4));
    }
}
