//! NeXML parser and writer for phylogenetic trees.
//!
//! NeXML stores taxa as `<otus>`/`<otu>` elements and each tree as a list
//! of `<node>` elements connected by `<edge source target [length]>`
//! elements, so trees are not restricted to a nesting order:
//!
//! ```xml
//! <nexml version="0.9">
//!   <otus id="os"><otu id="o1" label="Kakapo"/>...</otus>
//!   <trees id="ts" otus="os">
//!     <tree id="t1">
//!       <node id="n0" root="true"/><node id="n1" otu="o1"/>...
//!       <edge id="e1" source="n0" target="n1" length="0.5"/>...
//!     </tree>
//!   </trees>
//! </nexml>
//! ```
//!
//! Node annotations are read from and written as `<meta property content>`
//! children of `<node>`; the length of the edge above the root is a
//! `<rootedge>`.

pub mod parser;
pub mod writer;
mod xml;

pub use self::parser::NexmlParser;
pub use self::writer::NexmlWriter;

use crate::error::Result;
use crate::format::DatasetFormat;
use crate::model::dataset::Dataset;
use crate::parser::byte_parser::ByteParser;
use std::io::Write;

/// NeXML handler for [DatasetFormat].
#[derive(Debug, Clone, Copy, Default)]
pub struct NexmlFormat;

impl DatasetFormat for NexmlFormat {
    fn name(&self) -> &'static str {
        "nexml"
    }

    fn parse_into(&self, input: Vec<u8>, dataset: &mut Dataset) -> Result<()> {
        NexmlParser::new(ByteParser::from_vec(input)).parse_into(dataset)?;
        Ok(())
    }

    fn write_dataset(&self, dataset: &Dataset, out: &mut dyn Write) -> Result<()> {
        NexmlWriter::new(out).write_dataset(dataset)?;
        Ok(())
    }
}
