//! Newick format parser and writer for phylogenetic trees.
//!
//! This module provides [`NewickParser`] to parse Newick strings into
//! [`Tree`]s bound to a [`TaxonNamespace`], and [`NewickWriter`] to write
//! them back. [`NewickFormat`] plugs both into the
//! [`DatasetFormat`](crate::format::DatasetFormat) interface.
//!
//! # Quick API
//! For simple use cases with default settings:
//! * [`parse_tree`] - parses a single tree string
//! * [`parse_trees`] - parses all trees of a string
//! * [`parse_file`] - parses all trees of a file
//! * [`to_newick`] - writes a single tree
//! * [`write_newick_file`] - writes trees to a file, one per line
//!
//! # Full API
//! For more control, configure a [`NewickParser`] and provide a [`ByteParser`]:
//! * [`NewickParser::parse_str`] - parse a single tree
//! * [`NewickParser::parse_all`] - parse all trees until EOF
//!
//! # Format
//! The Newick format has the following simple grammar:
//! * `tree ::= [rooting] node ';'`
//! * `rooting ::= '[&R]' | '[&U]'`
//! * `node ::= leaf | internal_node`
//! * `internal_node ::= '(' node (',' node)* ')' [label] suffix`
//! * `leaf ::= label suffix`
//! * `suffix ::= [annotation] [':' number [annotation]]`
//! * `annotation ::= '[&' key '=' value (',' key '=' value)* ']'`
//!
//! Furthermore:
//! * Whitespace can occur between elements,
//!   just not within an unquoted label or a branch length
//! * Comments are square brackets and can occur anywhere where whitespace is allowed
//! * Unquoted labels turn `_` into spaces, quoted labels (`'...'`) are taken
//!   verbatim with `''` as escaped quote

mod defs;
pub mod parser;
pub mod writer;

pub use self::parser::NewickParser;
pub use self::writer::{NewickStyle, NewickWriter};

use crate::error::{PhyloError, Result};
use crate::format::DatasetFormat;
use crate::model::dataset::Dataset;
use crate::model::taxon_namespace::TaxonNamespace;
use crate::model::tree::Tree;
use crate::parser::byte_parser::ByteParser;
use crate::parser::parsing_error::ParsingError;
use log::debug;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

// ============================================================================
// QUICK PARSING API (pub)
// ============================================================================
/// Parses a single Newick tree string.
///
/// New leaf labels are registered in `namespace`. If parsing fails, the
/// namespace is restored to its state before the call.
///
/// # Errors
/// Returns [PhyloError::Parse] if the string is not a single valid Newick tree.
///
/// # Example
/// ```
/// use phylosplit::model::TaxonNamespace;
/// use phylosplit::newick::parse_tree;
///
/// let mut taxa = TaxonNamespace::new();
/// let tree = parse_tree("(Fratercula_cirrhata,(Fratercula_arctica,Fratercula_corniculata));", &mut taxa).unwrap();
/// assert_eq!(tree.num_leaves(), 3);
/// assert_eq!(taxa.label(1), Some("Fratercula arctica"));
/// ```
pub fn parse_tree<S: AsRef<str>>(newick: S, namespace: &mut TaxonNamespace) -> Result<Tree> {
    let mark = namespace.mark();
    parse_single(newick.as_ref(), namespace).map_err(|e| {
        namespace.rollback(mark);
        PhyloError::from(e)
    })
}

fn parse_single(newick: &str, namespace: &mut TaxonNamespace) -> std::result::Result<Tree, ParsingError> {
    let mut byte_parser = ByteParser::for_str(newick);
    let tree = NewickParser::new().parse_str(&mut byte_parser, namespace)?;
    byte_parser.skip_comment_and_whitespace()?;
    if !byte_parser.is_eof() {
        return Err(ParsingError::invalid_newick_string(
            &byte_parser,
            "Unexpected content after tree".to_string(),
        ));
    }
    Ok(tree)
}

/// Parses all Newick trees of a string (semicolon-terminated, any
/// whitespace or comments in between).
///
/// # Errors
/// Returns [PhyloError::Parse] for the first invalid tree; the namespace
/// is restored to its state before the call.
pub fn parse_trees<S: AsRef<str>>(input: S, namespace: &mut TaxonNamespace) -> Result<Vec<Tree>> {
    parse_bytes(input.as_ref().as_bytes().to_vec(), namespace)
}

/// Parses all Newick trees of a file.
///
/// # Arguments
/// * `path` - Path to the file (accepting `&str`, `String`, `Path`, or `PathBuf`)
///   with a list of semicolon-terminated Newick strings
/// * `namespace` - Namespace to register leaf labels in
///
/// # Errors
/// Returns [PhyloError::Io] if the file cannot be read, or
/// [PhyloError::Parse] if its content is not valid Newick.
pub fn parse_file<P: AsRef<Path>>(path: P, namespace: &mut TaxonNamespace) -> Result<Vec<Tree>> {
    let contents = fs::read(path.as_ref())?;
    debug!("Read {} bytes from {}", contents.len(), path.as_ref().display());
    parse_bytes(contents, namespace)
}

fn parse_bytes(input: Vec<u8>, namespace: &mut TaxonNamespace) -> Result<Vec<Tree>> {
    let mark = namespace.mark();
    let mut byte_parser = ByteParser::from_vec(input);
    NewickParser::new()
        .parse_all(&mut byte_parser, namespace)
        .map_err(|e| {
            namespace.rollback(mark);
            PhyloError::from(e)
        })
}

// ============================================================================
// QUICK WRITING API (pub)
// ============================================================================
/// Returns the Newick string of `tree` written with a default [NewickWriter].
///
/// # Errors
/// Returns [PhyloError::InvalidTree] if the tree has no root.
pub fn to_newick(tree: &Tree, namespace: &TaxonNamespace) -> Result<String> {
    NewickWriter::new().write_tree(tree, namespace)
}

/// Writes trees to a file in Newick format, one tree per line.
///
/// # Errors
/// Returns [PhyloError::Io] if creating or writing the file fails, or
/// [PhyloError::InvalidTree] for a tree without root.
pub fn write_newick_file<P: AsRef<Path>>(path: P, trees: &[Tree], namespace: &TaxonNamespace) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    NewickWriter::new().write_trees(&mut writer, trees, namespace)?;
    writer.flush()?;
    Ok(())
}

// ============================================================================
// DATASET FORMAT
// ============================================================================
/// Newick handler for [DatasetFormat].
///
/// Reading binds all trees of the input to one namespace (the attached one
/// or a new one) in one trees block. Writing concatenates all trees blocks,
/// one tree per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewickFormat;

impl DatasetFormat for NewickFormat {
    fn name(&self) -> &'static str {
        "newick"
    }

    fn parse_into(&self, input: Vec<u8>, dataset: &mut Dataset) -> Result<()> {
        let namespace = dataset.namespace_for_read();
        let mut byte_parser = ByteParser::from_vec(input);
        let trees = NewickParser::new().parse_all(&mut byte_parser, dataset.namespace_mut(namespace))?;

        debug!("Parsed {} Newick trees", trees.len());
        let block = dataset.add_trees_block(namespace);
        for tree in trees {
            block.push(tree);
        }
        Ok(())
    }

    fn write_dataset(&self, dataset: &Dataset, out: &mut dyn Write) -> Result<()> {
        let writer = NewickWriter::new();
        for block in dataset.trees_blocks() {
            writer.write_trees(out, block.trees(), dataset.namespace(block.namespace()))?;
        }
        out.flush()?;
        Ok(())
    }
}
