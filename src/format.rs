//! Format-independent reading and writing of datasets.
//!
//! Every supported file format implements [DatasetFormat]. The [Format]
//! enum selects an implementation by file extension or by name, and
//! [read_dataset_file] / [write_dataset_file] combine both.
//!
//! # Example
//! ```
//! use phylosplit::format::{DatasetFormat, Format};
//!
//! let dataset = Format::Newick.handler().read_dataset(&mut "((A,B),C);".as_bytes()).unwrap();
//! let nexml = Format::NeXml.handler().write_string(&dataset).unwrap();
//!
//! let again = Format::NeXml.handler().read_dataset(&mut nexml.as_bytes()).unwrap();
//! assert_eq!(again.namespace(0).labels(), &["A", "B", "C"]);
//! ```

use crate::error::{PhyloError, Result};
use crate::model::dataset::Dataset;
use log::{info, warn};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

pub use crate::newick::NewickFormat;
pub use crate::nexml::NexmlFormat;
pub use crate::nexus::NexusFormat;

// =#========================================================================#=
// DATASET FORMAT
// =#========================================================================#=
/// A tree file format that reads into and writes from a [Dataset].
///
/// Implementors provide [parse_into](Self::parse_into) and
/// [write_dataset](Self::write_dataset); the remaining methods are derived.
pub trait DatasetFormat {
    /// Lower-case name of the format.
    fn name(&self) -> &'static str;

    /// Parses `input` and appends its namespaces and trees blocks to
    /// `dataset`. On error, the dataset may hold partial results.
    fn parse_into(&self, input: Vec<u8>, dataset: &mut Dataset) -> Result<()>;

    /// Writes all namespaces and trees blocks of `dataset`.
    fn write_dataset(&self, dataset: &Dataset, out: &mut dyn Write) -> Result<()>;

    /// Parses `input` into `dataset`, removing all partial results if
    /// parsing fails.
    fn read_bytes_into(&self, input: Vec<u8>, dataset: &mut Dataset) -> Result<()> {
        let mark = dataset.mark();
        let result = self.parse_into(input, dataset);
        if let Err(err) = &result {
            warn!("Reading {} input failed, rolling back: {}", self.name(), err);
            dataset.rollback(mark);
        }
        result
    }

    /// Reads everything from `reader` into `dataset`, see [read_bytes_into](Self::read_bytes_into).
    fn read_into(&self, reader: &mut dyn Read, dataset: &mut Dataset) -> Result<()> {
        let mut input = Vec::new();
        reader.read_to_end(&mut input)?;
        self.read_bytes_into(input, dataset)
    }

    /// Parses a string into `dataset`, see [read_bytes_into](Self::read_bytes_into).
    fn read_str_into(&self, input: &str, dataset: &mut Dataset) -> Result<()> {
        self.read_bytes_into(input.as_bytes().to_vec(), dataset)
    }

    /// Reads everything from `reader` into a new dataset.
    fn read_dataset(&self, reader: &mut dyn Read) -> Result<Dataset> {
        let mut dataset = Dataset::new();
        self.read_into(reader, &mut dataset)?;
        Ok(dataset)
    }

    /// Writes `dataset` into a string.
    fn write_string(&self, dataset: &Dataset) -> Result<String> {
        let mut out = Vec::new();
        self.write_dataset(dataset, &mut out)?;
        String::from_utf8(out).map_err(|err| PhyloError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }
}

// =#========================================================================#=
// FORMAT
// =#========================================================================#=
/// The supported tree file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Newick,
    Nexus,
    NeXml,
}

impl Format {
    /// All formats.
    pub const ALL: [Format; 3] = [Format::Newick, Format::Nexus, Format::NeXml];

    /// Returns the format handler.
    pub fn handler(self) -> &'static dyn DatasetFormat {
        match self {
            Format::Newick => &NewickFormat,
            Format::Nexus => &NexusFormat,
            Format::NeXml => &NexmlFormat,
        }
    }

    /// Selects a format by file extension (case-insensitive, without dot):
    /// `nwk newick tre tree` for Newick, `nex nexus trees nxs` for Nexus,
    /// `xml nexml` for NeXML.
    pub fn from_extension(extension: &str) -> Option<Format> {
        match extension.to_ascii_lowercase().as_str() {
            "nwk" | "newick" | "tre" | "tree" => Some(Format::Newick),
            "nex" | "nexus" | "trees" | "nxs" => Some(Format::Nexus),
            "xml" | "nexml" => Some(Format::NeXml),
            _ => None,
        }
    }

    /// Selects a format by the extension of `path`.
    ///
    /// # Errors
    /// Returns [PhyloError::UnknownFormat] if the path has no known extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Format> {
        let path = path.as_ref();
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Format::from_extension)
            .ok_or_else(|| PhyloError::UnknownFormat(path.display().to_string()))
    }

    /// Returns the name of the format.
    pub fn name(self) -> &'static str {
        self.handler().name()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = PhyloError;

    /// Parses a format name (`newick`, `nexus`, `nexml`) or extension.
    fn from_str(s: &str) -> Result<Self> {
        Format::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .or_else(|| Format::from_extension(s))
            .ok_or_else(|| PhyloError::UnknownFormat(s.to_string()))
    }
}

// ============================================================================
// Files (pub)
// ============================================================================
/// Reads a tree file into `dataset`, with the format taken from `format`
/// or, if `None`, from the file extension. Fails without changing `dataset`.
///
/// # Errors
/// Returns [PhyloError::UnknownFormat] if no format is given and the
/// extension is unknown, [PhyloError::Io] if the file cannot be read, or the
/// error of the format's parser.
pub fn read_file_into<P: AsRef<Path>>(path: P, format: Option<Format>, dataset: &mut Dataset) -> Result<()> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => Format::from_path(path)?,
    };

    info!("Reading {} file {}", format, path.display());
    let input = fs::read(path)?;
    format.handler().read_bytes_into(input, dataset)
}

/// Reads a tree file into a new dataset, see [read_file_into].
pub fn read_dataset_file<P: AsRef<Path>>(path: P, format: Option<Format>) -> Result<Dataset> {
    let mut dataset = Dataset::new();
    read_file_into(path, format, &mut dataset)?;
    Ok(dataset)
}

/// Writes `dataset` to a file, with the format taken from `format` or, if
/// `None`, from the file extension.
///
/// # Errors
/// Returns [PhyloError::UnknownFormat] if no format is given and the
/// extension is unknown, or [PhyloError::Io] if writing fails.
pub fn write_dataset_file<P: AsRef<Path>>(path: P, dataset: &Dataset, format: Option<Format>) -> Result<()> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => Format::from_path(path)?,
    };

    info!("Writing {} trees as {} file {}", dataset.num_trees(), format, path.display());
    let mut writer = BufWriter::new(File::create(path)?);
    format.handler().write_dataset(dataset, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path("run1.trees").unwrap(), Format::Nexus);
        assert_eq!(Format::from_path("dir.v2/best.TRE").unwrap(), Format::Newick);
        assert_eq!(Format::from_path("a.nexml").unwrap(), Format::NeXml);
        assert!(matches!(Format::from_path("a.fasta"), Err(PhyloError::UnknownFormat(_))));
        assert!(Format::from_path("README").is_err());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("NeXML".parse::<Format>().unwrap(), Format::NeXml);
        assert_eq!("nwk".parse::<Format>().unwrap(), Format::Newick);
        assert!("phylip".parse::<Format>().is_err());
    }

    #[test]
    fn test_failed_read_rolls_back() {
        let mut dataset = Dataset::new();
        NewickFormat.read_str_into("(A,B);", &mut dataset).unwrap();
        let before = dataset.clone();

        assert!(NewickFormat.read_str_into("(C,D);(E,", &mut dataset).is_err());
        assert_eq!(dataset, before);
    }
}
