//! Newick format writing.

use crate::error::{PhyloError, Result};
use crate::model::annotation::{AnnotationValue, Annotations};
use crate::model::node::NodeIndex;
use crate::model::taxon_namespace::TaxonNamespace;
use crate::model::tree::Tree;
use crate::parser::utils::escape_label;
use std::io::Write;

/// Extra buffer in Newick string length/capacity estimate
const BUFFER_CHARS: usize = 10;

/// Style for serializing tree to Newick format,
/// controlling how leaf labels are represented in the output string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewickStyle {
    /// Use (escaped) taxon labels from the namespace
    #[default]
    Label,
    /// Use 1-based taxon indices (1, 2, 3, ...) as in Nexus `TRANSLATE` tables
    OneIndexed,
}

// =#========================================================================#=
// NEWICK WRITER
// =#========================================================================#=
/// Writer (configuration) for Newick strings.
///
/// By default everything the model holds is written: rooting comment,
/// internal labels, annotations, and branch lengths. The output of a
/// default writer reads back into an identical tree.
///
/// # Example
/// ```
/// use phylosplit::model::{BranchLength, Rooting, TaxonNamespace, Tree};
/// use phylosplit::newick::NewickWriter;
///
/// let mut taxa = TaxonNamespace::new();
/// let mut tree = Tree::new().with_rooting(Rooting::Rooted);
/// let a = tree.add_leaf(taxa.get_or_insert("Little Spotted Kiwi"), BranchLength::new(1.0));
/// let b = tree.add_leaf(taxa.get_or_insert("Great Spotted Kiwi"), BranchLength::new(1.5));
/// let root = tree.add_internal(vec![a, b], None);
/// tree.set_root(root);
///
/// let newick = NewickWriter::new().write_tree(&tree, &taxa).unwrap();
/// assert_eq!(newick, "[&R] (Little_Spotted_Kiwi:1,Great_Spotted_Kiwi:1.5);");
/// ```
#[derive(Debug, Clone)]
pub struct NewickWriter {
    style: NewickStyle,
    edge_lengths: bool,
    annotations: bool,
    internal_labels: bool,
    rooting_token: bool,
}

impl Default for NewickWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl NewickWriter {
    /// Creates a writer that writes all tree content with taxon labels.
    pub fn new() -> Self {
        NewickWriter {
            style: NewickStyle::Label,
            edge_lengths: true,
            annotations: true,
            internal_labels: true,
            rooting_token: true,
        }
    }

    /// Sets how leaves are represented.
    pub fn with_style(mut self, style: NewickStyle) -> Self {
        self.style = style;
        self
    }

    /// Omits branch lengths.
    pub fn without_edge_lengths(mut self) -> Self {
        self.edge_lengths = false;
        self
    }

    /// Omits `[&key=value]` annotations.
    pub fn without_annotations(mut self) -> Self {
        self.annotations = false;
        self
    }

    /// Omits labels of internal nodes.
    pub fn without_internal_labels(mut self) -> Self {
        self.internal_labels = false;
        self
    }

    /// Omits the leading `[&R]`/`[&U]` comment.
    pub fn without_rooting_token(mut self) -> Self {
        self.rooting_token = false;
        self
    }

    /// Returns the Newick representation of `tree` with closing semicolon.
    ///
    /// # Arguments
    /// * `tree` - The tree to write
    /// * `namespace` - Namespace the leaves' taxa refer to
    ///
    /// # Errors
    /// Returns [PhyloError::InvalidTree] if the tree has no root.
    pub fn write_tree(&self, tree: &Tree, namespace: &TaxonNamespace) -> Result<String> {
        let root = tree
            .root_index()
            .ok_or_else(|| PhyloError::InvalidTree(String::from("Cannot write a tree without root as Newick")))?;
        let mut newick = String::with_capacity(self.estimate_len(tree, namespace));

        if self.rooting_token
            && let Some(token) = tree.rooting().token()
        {
            newick.push_str(token);
            newick.push(' ');
        }
        self.build_newick(tree, namespace, root, &mut newick);
        newick.push(';');

        Ok(newick)
    }

    /// Writes all trees to `writer`, one tree per line.
    ///
    /// # Errors
    /// Returns [PhyloError::InvalidTree] for a tree without root, or
    /// [PhyloError::Io] if writing fails.
    pub fn write_trees<'a, W, I>(&self, writer: &mut W, trees: I, namespace: &TaxonNamespace) -> Result<()>
    where
        W: Write + ?Sized,
        I: IntoIterator<Item = &'a Tree>,
    {
        for tree in trees {
            writer.write_all(self.write_tree(tree, namespace)?.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    // Recursive helper for building the Newick string
    fn build_newick(&self, tree: &Tree, namespace: &TaxonNamespace, index: NodeIndex, newick: &mut String) {
        let node = tree.node(index);

        if node.is_leaf() {
            if let Some(taxon) = node.taxon() {
                match self.style {
                    NewickStyle::Label => newick.push_str(&escape_label(&namespace[taxon])),
                    NewickStyle::OneIndexed => newick.push_str(&(taxon + 1).to_string()),
                }
            }
        } else {
            newick.push('(');
            for (i, &child) in node.children().iter().enumerate() {
                if i > 0 {
                    newick.push(',');
                }
                self.build_newick(tree, namespace, child, newick);
            }
            newick.push(')');

            if self.internal_labels
                && let Some(label) = node.label()
            {
                newick.push_str(&escape_label(label));
            }
        }

        if self.annotations && !node.annotations().is_empty() {
            write_annotation_block(node.annotations(), newick);
        }
        if self.edge_lengths
            && let Some(length) = node.branch_length()
        {
            newick.push(':');
            newick.push_str(&length.to_string());
        }
    }

    /// Estimates the length of the Newick string to pre-allocate its capacity.
    fn estimate_len(&self, tree: &Tree, namespace: &TaxonNamespace) -> usize {
        // "(,)" per internal node, ~20 chars per branch length (":0.009529961339106089")
        const INTERNAL_NODE_CHARS: usize = 3;
        const BRANCH_LENGTH_CHARS: usize = 20;

        let label_capacity: usize = match self.style {
            NewickStyle::Label => tree
                .leaves()
                .filter_map(|leaf| leaf.taxon())
                .filter_map(|taxon| namespace.label(taxon))
                .map(|label| label.len() + 2)
                .sum(),
            NewickStyle::OneIndexed => tree.num_leaves() * (namespace.len().to_string().len()),
        };
        let branch_capacity = if self.edge_lengths && tree.has_branch_lengths() {
            tree.num_nodes() * BRANCH_LENGTH_CHARS
        } else {
            0
        };

        tree.num_internal() * INTERNAL_NODE_CHARS + label_capacity + branch_capacity + BUFFER_CHARS
    }
}

// ============================================================================
// Annotations
// ============================================================================
/// Appends `[&key=value,...]` to `out`.
pub(crate) fn write_annotation_block(annotations: &Annotations, out: &mut String) {
    out.push_str("[&");
    for (i, (key, value)) in annotations.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(key);
        out.push('=');
        out.push_str(&format_annotation_value(value));
    }
    out.push(']');
}

/// Formats an annotation value such that it is parsed back into the same value.
pub(crate) fn format_annotation_value(value: &AnnotationValue) -> String {
    match value {
        AnnotationValue::Int(v) => v.to_string(),
        AnnotationValue::Float(v) => format_float(*v),
        AnnotationValue::String(s) => {
            if s.starts_with('{') && s.ends_with('}') && braces_balanced(s) {
                s.clone()
            } else if needs_value_quoting(s) {
                format!("\"{}\"", s.replace('"', "\"\""))
            } else {
                s.clone()
            }
        }
    }
}

/// Floats that look like integers keep a `.0` so they are read back as floats.
fn format_float(v: f64) -> String {
    let text = v.to_string();
    if v.is_finite() && !text.contains(['.', 'e', 'E']) {
        format!("{text}.0")
    } else {
        text
    }
}

fn needs_value_quoting(s: &str) -> bool {
    s.is_empty()
        || s.chars()
            .any(|c| matches!(c, ',' | ']' | '[' | '=' | '{' | '}' | '"') || c.is_whitespace())
        || !matches!(AnnotationValue::infer(s), AnnotationValue::String(_))
}

fn braces_balanced(s: &str) -> bool {
    let mut depth = 0i64;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 && i + 1 != s.len() {
                    return false;
                }
            }
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::BranchLength;
    use crate::model::tree::Rooting;

    fn cherry() -> (Tree, TaxonNamespace) {
        let mut taxa = TaxonNamespace::from_labels(["A", "B", "C"]);
        let mut tree = Tree::new().with_rooting(Rooting::Unrooted);
        let a = tree.add_leaf(0, BranchLength::new(0.1));
        let b = tree.add_leaf(1, BranchLength::new(0.2));
        let ab = tree.add_internal(vec![a, b], BranchLength::new(0.3));
        let c = tree.add_leaf(taxa.get_or_insert("C"), None);
        let root = tree.add_internal(vec![ab, c], None);
        tree.set_root(root);
        (tree, taxa)
    }

    #[test]
    fn test_write_styles() {
        let (tree, taxa) = cherry();
        assert_eq!(NewickWriter::new().write_tree(&tree, &taxa).unwrap(), "[&U] ((A:0.1,B:0.2):0.3,C);");
        assert_eq!(
            NewickWriter::new()
                .with_style(NewickStyle::OneIndexed)
                .without_edge_lengths()
                .without_rooting_token()
                .write_tree(&tree, &taxa)
                .unwrap(),
            "((1,2),3);"
        );
    }

    #[test]
    fn test_annotation_values() {
        assert_eq!(format_annotation_value(&AnnotationValue::Float(2.0)), "2.0");
        assert_eq!(format_annotation_value(&AnnotationValue::Int(2)), "2");
        assert_eq!(format_annotation_value(&"red".into()), "red");
        assert_eq!(format_annotation_value(&"2".into()), "\"2\"");
        assert_eq!(format_annotation_value(&"dark red".into()), "\"dark red\"");
        assert_eq!(format_annotation_value(&"{1,2}".into()), "{1,2}");
        assert_eq!(format_annotation_value(&"{1}{2}".into()), "\"{1}{2}\"");
    }

    #[test]
    fn test_tree_without_root_is_rejected() {
        let taxa = TaxonNamespace::new();
        let result = NewickWriter::new().write_tree(&Tree::new(), &taxa);
        assert!(matches!(result, Err(PhyloError::InvalidTree(_))));
    }
}
