//! NeXML writing of a [Dataset].

use crate::model::annotation::{AnnotationValue, Annotations};
use crate::model::dataset::{Dataset, NamespaceIndex, TreesBlock};
use crate::model::node::{BranchLength, NodeIndex};
use crate::model::taxon_namespace::TaxonNamespace;
use crate::model::tree::{Rooting, Tree};
use crate::newick::writer::format_annotation_value;
use crate::nexml::xml::escape_attribute;
use std::io::{self, Write};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const NEXML_START: &str = concat!(
    r#"<nexml xmlns="http://www.nexml.org/2009""#,
    r#" xmlns:nex="http://www.nexml.org/2009""#,
    r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#,
    r#" xmlns:xsd="http://www.w3.org/2001/XMLSchema#" version="0.9">"#,
);

// =#========================================================================#=
// NEXML WRITER
// =#========================================================================#=
/// Writer for a [Dataset] as NeXML document.
///
/// Ids are generated from positions: `otus<k>` and `otu<k>_<i>` for the
/// k-th written namespace and its i-th taxon, `trees<b>` and `tree<b>_<t>`
/// for the t-th tree of the b-th trees block, `n<i>` and `e<i>` for the
/// i-th node in pre-order and the edge into it. Only trees with
/// [Rooting::Rooted] mark their root with `root="true"`.
///
/// # Example
/// ```
/// use phylosplit::format::{DatasetFormat, NewickFormat};
/// use phylosplit::nexml::NexmlWriter;
///
/// let dataset = NewickFormat.read_dataset(&mut "[&R] (A:1,B:2);".as_bytes()).unwrap();
///
/// let mut out = Vec::new();
/// NexmlWriter::new(&mut out).write_dataset(&dataset).unwrap();
/// let nexml = String::from_utf8(out).unwrap();
/// assert!(nexml.contains(r#"<node id="n0" root="true"/>"#));
/// assert!(nexml.contains(r#"<edge id="e1" source="n0" target="n1" length="1"/>"#));
/// ```
pub struct NexmlWriter<W: Write> {
    writer: W,
}

impl<W: Write> NexmlWriter<W> {
    /// Creates a new NeXML writer on top of the given writer.
    pub fn new(writer: W) -> NexmlWriter<W> {
        NexmlWriter { writer }
    }

    /// Writes a complete NeXML document with all taxa and trees of `dataset`.
    ///
    /// # Errors
    /// Returns an I/O error if writing fails
    pub fn write_dataset(&mut self, dataset: &Dataset) -> io::Result<()> {
        writeln!(self.writer, "{XML_DECLARATION}")?;
        writeln!(self.writer, "{NEXML_START}")?;

        let namespaces: Vec<NamespaceIndex> = (0..dataset.namespaces().len())
            .filter(|&index| {
                !dataset.namespace(index).is_empty()
                    || dataset.trees_blocks().iter().any(|block| block.namespace() == index)
            })
            .collect();

        for (k, &namespace) in namespaces.iter().enumerate() {
            self.write_otus(k, dataset.namespace(namespace))?;
        }
        for (b, block) in dataset.trees_blocks().iter().enumerate() {
            let k = namespaces
                .iter()
                .position(|&namespace| namespace == block.namespace())
                .unwrap_or_default();
            self.write_trees(b, k, block)?;
        }

        writeln!(self.writer, "</nexml>")?;
        self.writer.flush()
    }

    /// Consumes the NeXML writer and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_otus(&mut self, k: usize, namespace: &TaxonNamespace) -> io::Result<()> {
        if namespace.is_empty() {
            return writeln!(self.writer, "  <otus id=\"otus{k}\"/>");
        }

        writeln!(self.writer, "  <otus id=\"otus{k}\">")?;
        for (i, label) in namespace.iter() {
            writeln!(self.writer, "    <otu id=\"otu{k}_{i}\" label=\"{}\"/>", escape_attribute(label))?;
        }
        writeln!(self.writer, "  </otus>")
    }

    fn write_trees(&mut self, b: usize, k: usize, block: &TreesBlock) -> io::Result<()> {
        write!(self.writer, "  <trees id=\"trees{b}\" otus=\"otus{k}\"")?;
        if let Some(title) = block.title() {
            write!(self.writer, " label=\"{}\"", escape_attribute(title))?;
        }
        if block.is_empty() {
            return writeln!(self.writer, "/>");
        }
        writeln!(self.writer, ">")?;

        for (t, tree) in block.trees().iter().enumerate() {
            self.write_tree(&format!("tree{b}_{t}"), k, tree)?;
        }
        writeln!(self.writer, "  </trees>")
    }

    fn write_tree(&mut self, id: &str, k: usize, tree: &Tree) -> io::Result<()> {
        write!(self.writer, "    <tree id=\"{id}\" xsi:type=\"nex:FloatTree\"")?;
        if let Some(name) = tree.name() {
            write!(self.writer, " label=\"{}\"", escape_attribute(name))?;
        }
        let Some(root) = tree.root_index() else {
            return writeln!(self.writer, "/>");
        };
        writeln!(self.writer, ">")?;

        // Pre-order positions become node ids
        let order: Vec<NodeIndex> = tree.pre_order_iter().map(|node| node.index()).collect();
        let mut position = vec![0usize; tree.num_nodes()];
        for (i, &index) in order.iter().enumerate() {
            position[index] = i;
        }

        for (i, &index) in order.iter().enumerate() {
            let node = tree.node(index);
            write!(self.writer, "      <node id=\"n{i}\"")?;
            if let Some(label) = node.label() {
                write!(self.writer, " label=\"{}\"", escape_attribute(label))?;
            }
            if let Some(taxon) = node.taxon() {
                write!(self.writer, " otu=\"otu{k}_{taxon}\"")?;
            }
            if index == root && tree.rooting() == Rooting::Rooted {
                write!(self.writer, " root=\"true\"")?;
            }
            self.write_node_meta(node.annotations())?;
        }

        if let Some(length) = tree.node(root).branch_length() {
            writeln!(self.writer, "      <rootedge id=\"e0\" target=\"n0\" length=\"{}\"/>", length)?;
        }
        for (i, &index) in order.iter().enumerate().skip(1) {
            let node = tree.node(index);
            let source = node.parent().map(|parent| position[parent]).unwrap_or_default();
            write!(self.writer, "      <edge id=\"e{i}\" source=\"n{source}\" target=\"n{i}\"")?;
            write_length(&mut self.writer, node.branch_length())?;
            writeln!(self.writer, "/>")?;
        }

        writeln!(self.writer, "    </tree>")
    }

    /// Closes the open `<node` tag, with `<meta>` children for annotations.
    fn write_node_meta(&mut self, annotations: &Annotations) -> io::Result<()> {
        if annotations.is_empty() {
            return writeln!(self.writer, "/>");
        }

        writeln!(self.writer, ">")?;
        for (key, value) in annotations.iter() {
            let (content, datatype) = match value {
                AnnotationValue::Int(_) => (format_annotation_value(value), "xsd:integer"),
                AnnotationValue::Float(_) => (format_annotation_value(value), "xsd:double"),
                AnnotationValue::String(s) => (s.clone(), "xsd:string"),
            };
            writeln!(
                self.writer,
                "        <meta xsi:type=\"nex:LiteralMeta\" property=\"{}\" content=\"{}\" datatype=\"{datatype}\"/>",
                escape_attribute(key),
                escape_attribute(&content),
            )?;
        }
        writeln!(self.writer, "      </node>")
    }
}

fn write_length<W: Write>(writer: &mut W, length: Option<BranchLength>) -> io::Result<()> {
    match length {
        Some(length) => write!(writer, " length=\"{}\"", length),
        None => Ok(()),
    }
}
