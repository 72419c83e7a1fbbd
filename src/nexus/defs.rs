//! Keywords and delimiters of the Nexus format.

/// Nexus label delimiters: whitespace, comma, semicolon, start of comment
pub(crate) const NEXUS_LABEL_DELIMITERS: &[u8] = b" ,;\t\n\r[";

/// Tree name delimiters: like labels, plus the `=` of a tree statement
pub(crate) const TREE_NAME_DELIMITERS: &[u8] = b" ,;=\t\n\r[";

pub(crate) const NEXUS_HEADER: &[u8] = b"#NEXUS";

pub(crate) const BLOCK_BEGIN: &[u8] = b"BEGIN";

pub(crate) const BLOCK_END: &[u8] = b"END;";

pub(crate) const TITLE: &[u8] = b"TITLE";

pub(crate) const LINK: &[u8] = b"LINK";

// Taxa block
pub(crate) const TAXA: &[u8] = b"TAXA";

pub(crate) const DIMENSIONS: &[u8] = b"DIMENSIONS";

pub(crate) const NTAX: &[u8] = b"NTAX";

pub(crate) const TAXLABELS: &[u8] = b"TAXLABELS";

// Trees block
pub(crate) const TREES: &[u8] = b"TREES";

pub(crate) const TRANSLATE: &[u8] = b"TRANSLATE";

pub(crate) const TREE: &[u8] = b"TREE";

/// Block types of a Nexus file.
///
/// Only [Taxa](NexusBlock::Taxa) and [Trees](NexusBlock::Trees) blocks are
/// read, all others are skipped.
#[derive(Debug, PartialEq, Clone)]
pub enum NexusBlock {
    Taxa,
    Trees,
    Data,
    Characters,
    Distances,
    Sets,
    Assumptions,
    UnknownBlock(String),
}

impl NexusBlock {
    /// Parse a block name (case-insensitive) into a NexusBlock variant
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "taxa" => NexusBlock::Taxa,
            "trees" => NexusBlock::Trees,
            "data" => NexusBlock::Data,
            "characters" => NexusBlock::Characters,
            "distances" => NexusBlock::Distances,
            "sets" => NexusBlock::Sets,
            "assumptions" => NexusBlock::Assumptions,
            _ => NexusBlock::UnknownBlock(name.to_string()),
        }
    }
}
