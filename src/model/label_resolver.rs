//! Label resolution for Newick tree parsing.
//!
//! A leaf label in a Newick string is either the taxon label itself or, in
//! Nexus files, a key into a `TRANSLATE` table or a 1-based index into the
//! `TAXA` block. [LabelResolver] turns such a label into a [TaxonIndex].

use crate::model::taxon_namespace::{TaxonIndex, TaxonNamespace};
use std::collections::HashMap;

// =#========================================================================#=
// LABEL RESOLVER
// =#========================================================================#=
/// Resolves labels in Newick strings during parsing against a [TaxonNamespace].
///
/// - [VerbatimLabels](Self::VerbatimLabels): raw Newick files, or Nexus
///   trees without `TAXA` block and `TRANSLATE` command
/// - [NexusLabels](Self::NexusLabels): Nexus trees with a `TAXA` block
///   and/or `TRANSLATE` command
#[derive(Debug, Clone, Default)]
pub enum LabelResolver {
    /// Registers each label verbatim on first encounter.
    #[default]
    VerbatimLabels,

    /// Resolves labels, trying in order:
    /// 1. Key of the TRANSLATE table
    ///    (e.g. "terny" -> "White-fronted tern")
    /// 2. Integer as 1-based index of a taxon in the TAXA block
    ///    (e.g. 12 -> "White-fronted tern")
    /// 3. Verbatim label
    ///
    /// With a TAXA block, a verbatim label must be declared there. Without
    /// one, unknown verbatim labels are registered.
    NexusLabels {
        /// TRANSLATE key -> taxon
        translation: HashMap<String, TaxonIndex>,
        /// Taxa of the TAXA block in declaration order, if there is one
        declared: Option<Vec<TaxonIndex>>,
    },
}

impl LabelResolver {
    /// Resolves a parsed label to its taxon, registering it if allowed.
    ///
    /// # Errors
    /// Returns a description of the failure if the label cannot be resolved.
    pub fn resolve(&self, label: &str, namespace: &mut TaxonNamespace) -> Result<TaxonIndex, String> {
        match self {
            LabelResolver::VerbatimLabels => Ok(namespace.get_or_insert(label)),

            LabelResolver::NexusLabels { translation, declared } => {
                if let Some(&taxon) = translation.get(label) {
                    return Ok(taxon);
                }

                match declared {
                    Some(taxa) => {
                        if let Ok(nexus_index) = label.parse::<usize>() {
                            return nexus_index
                                .checked_sub(1)
                                .and_then(|i| taxa.get(i).copied())
                                .ok_or_else(|| {
                                    format!("taxon index {nexus_index} out of range 1-{}", taxa.len())
                                });
                        }
                        match namespace.index_of(label) {
                            Some(taxon) if taxa.contains(&taxon) => Ok(taxon),
                            _ => Err(label.to_string()),
                        }
                    }
                    None => Ok(namespace.get_or_insert(label)),
                }
            }
        }
    }
}
