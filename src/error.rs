//! Crate-level error type.
//!
//! Parsers report [ParsingError]s carrying position information; everything
//! a caller sees from the public API is a [PhyloError].

use crate::parser::parsing_error::{ParsingError, ParsingErrorType};
use thiserror::Error;

/// Errors that can occur when reading, writing or encoding trees.
#[derive(Error, Debug)]
pub enum PhyloError {
    /// Malformed input in any of the supported formats
    #[error(transparent)]
    Parse(ParsingError),
    /// A label or id reference that does not resolve against the taxon namespace
    #[error("Label mismatch: '{label}' {context}")]
    LabelMismatch {
        /// The offending label or reference
        label: String,
        /// Where the mismatch was detected
        context: String,
    },
    /// A group string whose length differs from the number of taxa
    #[error("Dimension mismatch: expected {expected} taxa but found {found}")]
    DimensionMismatch {
        /// Number of taxa in the namespace
        expected: usize,
        /// Number of symbols found
        found: usize,
    },
    /// A group string containing a symbol other than `*` and `.`
    #[error("Invalid split symbol '{symbol}' at position {position}")]
    InvalidSplitSymbol {
        /// The offending symbol
        symbol: char,
        /// Position in the group string (whitespace excluded)
        position: usize,
    },
    /// A split count larger than the number of trees it was counted over
    #[error("Split count {count} exceeds the {total} trees counted")]
    InvalidSplitCount {
        /// The offending count
        count: usize,
        /// Total number of trees
        total: usize,
    },
    /// A tree that violates the structural invariants of the model
    #[error("Invalid tree: {0}")]
    InvalidTree(String),
    /// A namespace index that does not exist in the dataset
    #[error("No namespace at index {index}; the dataset has {count}")]
    UnknownNamespace {
        /// The requested index
        index: usize,
        /// Number of namespaces in the dataset
        count: usize,
    },
    /// A file whose format cannot be derived from its extension
    #[error("Unknown tree file format: {0}")]
    UnknownFormat(String),
    /// Reading or writing failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ParsingError> for PhyloError {
    fn from(err: ParsingError) -> Self {
        match err.kind() {
            ParsingErrorType::UnresolvedLabel(label) => PhyloError::LabelMismatch {
                label: label.clone(),
                context: format!("at line {}, column {}", err.line(), err.column()),
            },
            _ => PhyloError::Parse(err),
        }
    }
}

impl PhyloError {
    /// Returns the underlying [ParsingError], if this is a parse error.
    pub fn as_parsing_error(&self) -> Option<&ParsingError> {
        match self {
            PhyloError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = PhyloError> = std::result::Result<T, E>;
