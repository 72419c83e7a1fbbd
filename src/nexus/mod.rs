//! Nexus format parser and writer for phylogenetic trees.
//!
//! This module provides:
//! - [NexusParser] — for reading Nexus files into a [Dataset]
//! - [NexusWriter] — for writing a [Dataset] as Nexus file
//! - [NexusFormat] — both behind the [DatasetFormat] interface
//!
//! # Quick API
//! For simple use cases with default settings:
//! - [`parse_file`] — parses a file into a new [Dataset]
//! - [`write_nexus_file`] — writes a [Dataset] to a file
//!
//! # Format
//! A Nexus file starts with `#NEXUS` followed by blocks
//! `BEGIN <name>; <commands> END;` (or `ENDBLOCK;`), names and keywords
//! being case-insensitive. Read are:
//! - `TAXA` blocks with commands `TITLE`, `DIMENSIONS NTAX=n;` and
//!   `TAXLABELS label ...;`, the number of labels matching `ntax`
//! - `TREES` blocks with commands `TITLE`, `LINK TAXA = title;`,
//!   `TRANSLATE key label, ...;` and `TREE [*] name = [&R|&U] newick;`
//!   (`UTREE` for unrooted trees)
//!
//! Leaf labels in tree commands resolve, in order, as `TRANSLATE` key,
//! 1-based index into the `TAXA` block, or verbatim label. With a `TAXA`
//! block, every label must be declared in it.
//!
//! ## Labels
//! * A label with a space may be written with underscores instead
//!   (`Wilson's_Storm-petrel`) or enclosed in single quotes
//! * A label with an apostrophe must be enclosed in single quotes
//!   and the apostrophe must be escaped with an apostrophe/single quote:
//!   e.g. `Wilson's Storm-petrel` becomes `'Wilson''s Storm-petrel'`
//! * Comments `[...]` are allowed between any two tokens

mod defs;
pub mod parser;
pub mod writer;

pub use self::defs::NexusBlock;
pub use self::parser::NexusParser;
pub use self::writer::NexusWriter;

use crate::error::Result;
use crate::format::DatasetFormat;
use crate::model::dataset::Dataset;
use crate::parser::byte_parser::ByteParser;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

// ============================================================================
// QUICK API (public)
// ============================================================================
/// Parses a Nexus file into a new [Dataset].
///
/// # Arguments
/// * `path` - Path to the file (accepting `&str`, `String`, `Path`, or `PathBuf`)
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let contents = fs::read(path.as_ref())?;
    info!("Parsing Nexus file {}", path.as_ref().display());
    let mut dataset = Dataset::new();
    NexusFormat.parse_into(contents, &mut dataset)?;
    Ok(dataset)
}

/// Writes `dataset` to a file in Nexus format.
///
/// # Errors
/// Returns an I/O error if creating or writing the file fails.
pub fn write_nexus_file<P: AsRef<Path>>(path: P, dataset: &Dataset) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    NexusWriter::new(writer).write_dataset(dataset)?;
    Ok(())
}

// ============================================================================
// DATASET FORMAT
// ============================================================================
/// Nexus handler for [DatasetFormat].
#[derive(Debug, Clone, Copy, Default)]
pub struct NexusFormat;

impl DatasetFormat for NexusFormat {
    fn name(&self) -> &'static str {
        "nexus"
    }

    fn parse_into(&self, input: Vec<u8>, dataset: &mut Dataset) -> Result<()> {
        let num_blocks = dataset.trees_blocks().len();
        NexusParser::new(ByteParser::from_vec(input)).parse_into(dataset)?;
        debug!("Parsed {} Nexus trees blocks", dataset.trees_blocks().len() - num_blocks);
        Ok(())
    }

    fn write_dataset(&self, dataset: &Dataset, out: &mut dyn Write) -> Result<()> {
        NexusWriter::new(out).write_dataset(dataset)?;
        Ok(())
    }
}
