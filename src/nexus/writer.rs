//! Nexus format writing of a [Dataset].

use crate::error::Result;
use crate::model::dataset::{Dataset, NamespaceIndex, TreesBlock};
use crate::model::taxon_namespace::TaxonNamespace;
use crate::newick::{NewickStyle, NewickWriter};
use crate::nexus::defs::{
    BLOCK_BEGIN, BLOCK_END, DIMENSIONS, LINK, NEXUS_HEADER, NTAX, TAXA, TAXLABELS, TITLE, TRANSLATE, TREE, TREES,
};
use crate::parser::utils::escape_label;
use std::io::{self, Write};

// =#========================================================================#=
// NEXUS WRITER
// =#========================================================================#=
/// Writer for a [Dataset] in Nexus format.
///
/// # Format Structure
/// The writer produces a Nexus file with the following structure:
/// - `#NEXUS` header
/// - a `TAXA` block per namespace (that is non-empty or has trees)
/// - a `TREES` block per trees block, with `TRANSLATE` command (1-based
///   integer keys) and tree definitions
///
/// TAXA blocks get a `TITLE` and trees blocks a `LINK` command only if the
/// dataset has more than one namespace to write. A trees block with a
/// title of its own always keeps it.
///
/// # Example
/// ```
/// use phylosplit::format::{DatasetFormat, NewickFormat};
/// use phylosplit::nexus::NexusWriter;
///
/// let dataset = NewickFormat.read_dataset(&mut "[&U] ((A:1,B:2):0.5,C:3);".as_bytes()).unwrap();
///
/// let mut out = Vec::new();
/// NexusWriter::new(&mut out).write_dataset(&dataset).unwrap();
/// let nexus = String::from_utf8(out).unwrap();
/// assert!(nexus.contains("\tTREE 'tree_1' = [&U] ((1:1,2:2):0.5,3:3);"));
/// ```
pub struct NexusWriter<W: Write> {
    writer: W,
}

// ============================================================================
// API (public)
// ============================================================================
impl<W: Write> NexusWriter<W> {
    /// Creates a new Nexus writer on top of the given writer.
    ///
    /// Wrap files in a [BufWriter](std::io::BufWriter); the writer is
    /// flushed at the end of [write_dataset](Self::write_dataset).
    pub fn new(writer: W) -> NexusWriter<W> {
        NexusWriter { writer }
    }

    /// Writes a complete Nexus file with all taxa and trees of `dataset`.
    ///
    /// # Errors
    /// Returns [PhyloError::Io](crate::PhyloError::Io) if writing fails, or
    /// [PhyloError::InvalidTree](crate::PhyloError::InvalidTree) for a tree
    /// without root.
    pub fn write_dataset(&mut self, dataset: &Dataset) -> Result<()> {
        let namespaces = namespaces_to_write(dataset);
        let with_titles = namespaces.len() > 1;

        self.header()?;
        for (k, &namespace) in namespaces.iter().enumerate() {
            let title = with_titles.then(|| taxa_title(k));
            self.taxa_block(dataset.namespace(namespace), title.as_deref())?;
        }
        for block in dataset.trees_blocks() {
            let link = if with_titles {
                namespaces
                    .iter()
                    .position(|&namespace| namespace == block.namespace())
                    .map(taxa_title)
            } else {
                None
            };
            self.trees_block(block, dataset.namespace(block.namespace()), link.as_deref())?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Consumes the Nexus writer and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Namespaces that are non-empty or have trees, in dataset order.
fn namespaces_to_write(dataset: &Dataset) -> Vec<NamespaceIndex> {
    (0..dataset.namespaces().len())
        .filter(|&index| {
            !dataset.namespace(index).is_empty()
                || dataset.trees_blocks().iter().any(|block| block.namespace() == index)
        })
        .collect()
}

fn taxa_title(k: usize) -> String {
    format!("Taxa{}", k + 1)
}

// ============================================================================
// Nexus Block & Command Writing (private)
// ============================================================================
impl<W: Write> NexusWriter<W> {
    /// Writes the Nexus file header ("#NEXUS"), returning itself for chaining.
    fn header(&mut self) -> io::Result<&mut Self> {
        self.write_all(NEXUS_HEADER)?.newline()?;
        Ok(self)
    }

    /// Writes the TAXA block with dimensions and taxon labels, returning itself for chaining.
    fn taxa_block(&mut self, namespace: &TaxonNamespace, title: Option<&str>) -> io::Result<&mut Self> {
        // "BEGIN TAXA;"
        self.newline()?.block_begin(TAXA)?;
        if let Some(title) = title {
            self.title_cmd(title)?;
        }

        // "\tDIMENSIONS NTAX=n;"
        self.tab()?
            .write_all(DIMENSIONS)?
            .space()?
            .write_all(NTAX)?
            .equals()?
            .write_all(namespace.len().to_string().as_bytes())?
            .semicolon_ln()?;

        // "\tTAXLABELS [label ...];"
        self.tab()?.write_all(TAXLABELS)?;
        for label in namespace.labels() {
            self.newline()?.tab()?.tab()?.write_all(escape_label(label).as_bytes())?;
        }
        self.newline()?.tab()?.semicolon_ln()?;

        // "END;"
        self.write_all(BLOCK_END)?.newline()?;

        Ok(self)
    }

    /// Writes a TREES block with TRANSLATE command and tree list, returning itself for chaining.
    fn trees_block(&mut self, block: &TreesBlock, namespace: &TaxonNamespace, link: Option<&str>) -> Result<&mut Self> {
        // "BEGIN TREES;"
        self.newline()?.block_begin(TREES)?;
        if let Some(title) = block.title() {
            self.title_cmd(title)?;
        }
        if let Some(link) = link {
            // "\tLINK TAXA = title;"
            self.tab()?
                .write_all(LINK)?
                .space()?
                .write_all(TAXA)?
                .space()?
                .equals()?
                .space()?
                .write_all(escape_label(link).as_bytes())?
                .semicolon_ln()?;
        }

        self.translate_cmd(namespace)?.tree_cmd_list(block, namespace)?;

        // "END;"
        self.write_all(BLOCK_END)?.newline()?;

        Ok(self)
    }

    /// Writes the TRANSLATE command mapping 1-based indices to labels, returning itself for chaining.
    fn translate_cmd(&mut self, namespace: &TaxonNamespace) -> io::Result<&mut Self> {
        if namespace.is_empty() {
            return Ok(self);
        }

        // "\tTRANSLATE\n\t\t1 label,\n ...;"
        self.tab()?.write_all(TRANSLATE)?.newline()?;
        for (index, label) in namespace.iter() {
            self.tab()?
                .tab()?
                .write_all((index + 1).to_string().as_bytes())?
                .space()?
                .write_all(escape_label(label).as_bytes())?;

            // No comma after last pair
            if index + 1 < namespace.len() {
                self.comma()?;
            }
            self.newline()?;
        }
        self.tab()?.semicolon_ln()?;

        Ok(self)
    }

    /// Writes the list of TREE commands in Newick format, returning itself for chaining.
    fn tree_cmd_list(&mut self, block: &TreesBlock, namespace: &TaxonNamespace) -> Result<&mut Self> {
        let newick_writer = NewickWriter::new().with_style(NewickStyle::OneIndexed);

        // "\tTREE <name> = <Newick;>"
        for (i, tree) in block.trees().iter().enumerate() {
            let name = tree
                .name()
                .map(|name| name.to_string())
                .unwrap_or_else(|| format!("tree_{}", i + 1));

            self.tab()?
                .write_all(TREE)?
                .space()?
                .write_all(escape_label(&name).as_bytes())?
                .space()?
                .equals()?
                .space()?
                .write_all(newick_writer.write_tree(tree, namespace)?.as_bytes())?
                .newline()?;
        }

        Ok(self)
    }

    /// Writes "BEGIN <name>;" and a newline, returning itself for chaining.
    fn block_begin(&mut self, name: &[u8]) -> io::Result<&mut Self> {
        self.write_all(BLOCK_BEGIN)?.space()?.write_all(name)?.semicolon_ln()
    }

    /// Writes "\tTITLE <title>;" and a newline, returning itself for chaining.
    fn title_cmd(&mut self, title: &str) -> io::Result<&mut Self> {
        self.tab()?
            .write_all(TITLE)?
            .space()?
            .write_all(escape_label(title).as_bytes())?
            .semicolon_ln()
    }
}

// ============================================================================
// Little Helpers (private)
// ============================================================================
impl<W: Write> NexusWriter<W> {
    /// Appends a byte slice to the writer, returning itself for chaining.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<&mut Self> {
        self.writer.write_all(buf)?;
        Ok(self)
    }

    /// Appends a space character (' '), returning itself for chaining.
    fn space(&mut self) -> io::Result<&mut Self> {
        self.write_all(b" ")
    }

    /// Appends a tab character ('\t'), returning itself for chaining.
    fn tab(&mut self) -> io::Result<&mut Self> {
        self.write_all(b"\t")
    }

    /// Appends a newline character ('\n'), returning itself for chaining.
    fn newline(&mut self) -> io::Result<&mut Self> {
        self.write_all(b"\n")
    }

    /// Appends a semicolon followed by a newline (';\n'), returning itself for chaining.
    fn semicolon_ln(&mut self) -> io::Result<&mut Self> {
        self.write_all(b";\n")
    }

    /// Appends a comma (','), returning itself for chaining.
    fn comma(&mut self) -> io::Result<&mut Self> {
        self.write_all(b",")
    }

    /// Appends an equals sign ('='), returning itself for chaining.
    fn equals(&mut self) -> io::Result<&mut Self> {
        self.write_all(b"=")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tree::Tree;

    fn write(dataset: &Dataset) -> String {
        let mut out = Vec::new();
        NexusWriter::new(&mut out).write_dataset(dataset).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_single_namespace_has_no_titles() {
        let mut taxa = TaxonNamespace::new();
        let mut tree = Tree::new().with_name("Kea tree");
        let a = tree.add_leaf(taxa.get_or_insert("Nestor notabilis"), None);
        let b = tree.add_leaf(taxa.get_or_insert("Nestor meridionalis"), None);
        let root = tree.add_internal(vec![a, b], None);
        tree.set_root(root);

        let nexus = write(&Dataset::from_tree(tree, taxa));
        let expected = "#NEXUS\n\
            \nBEGIN TAXA;\n\tDIMENSIONS NTAX=2;\n\tTAXLABELS\n\t\tNestor_notabilis\n\t\tNestor_meridionalis\n\t;\nEND;\n\
            \nBEGIN TREES;\n\tTRANSLATE\n\t\t1 Nestor_notabilis,\n\t\t2 Nestor_meridionalis\n\t;\n\tTREE Kea_tree = (1,2);\nEND;\n";
        assert_eq!(nexus, expected);
    }

    #[test]
    fn test_multiple_namespaces_are_linked() {
        let mut dataset = Dataset::new();
        for label in ["A", "B"] {
            let namespace = dataset.add_namespace(TaxonNamespace::from_labels([label]));
            let mut tree = Tree::new();
            let leaf = tree.add_leaf(0, None);
            tree.set_root(leaf);
            dataset.add_trees_block(namespace).push(tree);
        }

        let nexus = write(&dataset);
        assert!(nexus.contains("\tTITLE Taxa1;\n"));
        assert!(nexus.contains("\tLINK TAXA = Taxa2;\n"));
    }

    #[test]
    fn test_tree_without_root_is_rejected() {
        let mut dataset = Dataset::new();
        let namespace = dataset.add_namespace(TaxonNamespace::from_labels(["A"]));
        dataset.add_trees_block(namespace).push(Tree::new());

        let result = NexusWriter::new(Vec::new()).write_dataset(&dataset);
        assert!(matches!(result, Err(crate::error::PhyloError::InvalidTree(_))));
    }
}
