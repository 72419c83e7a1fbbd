//! Nexus file parsing into a [Dataset].

use crate::model::dataset::{Dataset, NamespaceIndex};
use crate::model::label_resolver::LabelResolver;
use crate::model::taxon_namespace::TaxonIndex;
use crate::model::tree::{Rooting, Tree};
use crate::newick::NewickParser;
use crate::nexus::defs::*;
use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_parser::ConsumeMode::Exclusive;
use crate::parser::byte_source::ByteSource;
use crate::parser::parsing_error::ParsingError;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// A TAXA block read from the current file.
#[derive(Debug)]
struct TaxaBlock {
    title: Option<String>,
    namespace: NamespaceIndex,
    taxa: Vec<TaxonIndex>,
}

// =#========================================================================#=
// NEXUS PARSER
// =#========================================================================#=
/// Parser for Nexus files with `TAXA` and `TREES` blocks.
///
/// Each `TAXA` block registers its taxa in a namespace of the dataset (the
/// attached one, or a new one per block). Each `TREES` block becomes one
/// [TreesBlock](crate::model::TreesBlock) bound to the namespace of its
/// linked `TAXA` block (`LINK TAXA = title`), or of the last one read.
/// Other blocks are skipped.
///
/// # Example
/// ```
/// use phylosplit::model::Dataset;
/// use phylosplit::nexus::NexusParser;
/// use phylosplit::parser::ByteParser;
///
/// let input = "#NEXUS
/// BEGIN TAXA;
///     DIMENSIONS NTAX=3;
///     TAXLABELS Pica_pica Corvus_corax Garrulus_glandarius;
/// END;
/// BEGIN TREES;
///     TREE corvids = [&U] ((1,2),3);
/// END;";
///
/// let mut dataset = Dataset::new();
/// NexusParser::new(ByteParser::for_str(input)).parse_into(&mut dataset).unwrap();
///
/// let tree = &dataset.trees_blocks()[0][0];
/// assert_eq!(tree.name(), Some("corvids"));
/// assert_eq!(dataset.namespace(0).label(1), Some("Corvus corax"));
/// ```
pub struct NexusParser<S: ByteSource> {
    byte_parser: ByteParser<S>,
    newick_parser: NewickParser,
    taxa_blocks: Vec<TaxaBlock>,
}

// ============================================================================
// API (pub)
// ============================================================================
impl<S: ByteSource> NexusParser<S> {
    /// Creates a parser over the given byte parser.
    pub fn new(byte_parser: ByteParser<S>) -> Self {
        NexusParser {
            byte_parser,
            newick_parser: NewickParser::new(),
            taxa_blocks: Vec::new(),
        }
    }

    /// Parses the whole file and appends its taxa and trees to `dataset`.
    ///
    /// # Errors
    /// Returns a [ParsingError] if the header is missing, a block is
    /// malformed, or a label cannot be resolved. The dataset may then
    /// contain partial results; use [Dataset::mark] and [Dataset::rollback]
    /// (or [DatasetFormat::read_into](crate::format::DatasetFormat::read_into))
    /// to undo them.
    pub fn parse_into(&mut self, dataset: &mut Dataset) -> Result<(), ParsingError> {
        self.parse_nexus_header()?;

        loop {
            self.byte_parser.skip_comment_and_whitespace()?;
            if self.byte_parser.is_eof() {
                break;
            }

            match self.detect_next_block()? {
                NexusBlock::Taxa => self.parse_taxa_block(dataset)?,
                NexusBlock::Trees => self.parse_trees_block(dataset)?,
                other => {
                    warn!("Skipping unsupported Nexus block {:?}", other);
                    self.skip_to_block_end()?;
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// File structure (private)
// ============================================================================
impl<S: ByteSource> NexusParser<S> {
    /// Parse header `#NEXUS` at start of file or throw `ParsingError::MissingNexusHeader` otherwise.
    fn parse_nexus_header(&mut self) -> Result<(), ParsingError> {
        self.byte_parser.skip_comment_and_whitespace()?;

        if !self.byte_parser.consume_if_sequence(NEXUS_HEADER) {
            return Err(ParsingError::missing_nexus_header(&self.byte_parser));
        }

        Ok(())
    }

    /// Detect the next Nexus block, which must start with `BEGIN <BlockType>;` (case-insensitive),
    /// and return its BlockType, or a ParsingError if something wrong.
    fn detect_next_block(&mut self) -> Result<NexusBlock, ParsingError> {
        let parser = &mut self.byte_parser;
        if !parser.consume_if_keyword(str_of(BLOCK_BEGIN)) {
            return Err(ParsingError::invalid_formatting(parser));
        }
        parser.skip_comment_and_whitespace()?;

        let start_pos = parser.position();
        if !parser.consume_until(b';', Exclusive) {
            return Err(ParsingError::unexpected_eof(parser));
        }

        let block_name = std::str::from_utf8(parser.slice_from(start_pos))
            .map_err(|_| ParsingError::invalid_block_name(parser))?
            .trim()
            .to_string();
        if block_name.is_empty() {
            return Err(ParsingError::invalid_block_name(parser));
        }

        parser.next_byte(); // consume the ';' now (already know that this is next byte)

        Ok(NexusBlock::from_name(&block_name))
    }

    /// Consumes `END;` or `ENDBLOCK;` if next, returning whether it did.
    fn consume_block_end(&mut self) -> Result<bool, ParsingError> {
        let parser = &mut self.byte_parser;
        if !parser.consume_if_keyword("ENDBLOCK") && !parser.consume_if_keyword("END") {
            return Ok(false);
        }

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b';') {
            return Err(ParsingError::invalid_formatting(parser));
        }
        Ok(true)
    }

    /// Skip block, continuing until encountered `END;` or `ENDBLOCK;`.
    fn skip_to_block_end(&mut self) -> Result<(), ParsingError> {
        loop {
            self.byte_parser.skip_comment_and_whitespace()?;
            if self.byte_parser.is_eof() {
                return Err(ParsingError::unexpected_eof(&self.byte_parser));
            }
            if self.consume_block_end()? {
                return Ok(());
            }
            self.skip_command()?;
        }
    }

    /// Skips the rest of a command up to and including its `;`, stepping
    /// over quoted labels and comments.
    fn skip_command(&mut self) -> Result<(), ParsingError> {
        let parser = &mut self.byte_parser;
        loop {
            match parser.peek() {
                None => return Err(ParsingError::unexpected_eof(parser)),
                Some(b';') => {
                    parser.next_byte();
                    return Ok(());
                }
                Some(quote @ (b'\'' | b'"')) => {
                    parser.parse_quoted(quote)?;
                }
                Some(b'[') => {
                    parser.skip_comment()?;
                }
                Some(_) => {
                    parser.next_byte();
                }
            }
        }
    }

    /// Expects the `;` terminating a command.
    fn expect_semicolon(&mut self, block: &str) -> Result<(), ParsingError> {
        self.byte_parser.skip_comment_and_whitespace()?;
        if self.byte_parser.consume_if(b';') {
            return Ok(());
        }
        let msg = format!("Expected ';' to end command in {block} block");
        Err(if block == "TAXA" {
            ParsingError::invalid_taxa_block(&self.byte_parser, msg)
        } else {
            ParsingError::invalid_trees_block(&self.byte_parser, msg)
        })
    }

    /// Parses `TITLE name;` after the keyword.
    fn parse_title(&mut self, block: &str) -> Result<String, ParsingError> {
        let title = self.byte_parser.parse_label(NEXUS_LABEL_DELIMITERS, true)?;
        self.expect_semicolon(block)?;
        Ok(title)
    }
}

// ============================================================================
// TAXA block (private)
// ============================================================================
impl<S: ByteSource> NexusParser<S> {
    /// Parse TAXA block extracting number of taxa from `DIMENSIONS NTAX=n`
    /// command and taxon list from `TAXLABELS` command, ignoring any other command.
    ///
    /// # Errors
    /// Return [ParsingError::unexpected_eof] if block, command, or comment not properly closed,
    /// and [ParsingError::invalid_taxa_block] if the labels do not match `ntax`.
    fn parse_taxa_block(&mut self, dataset: &mut Dataset) -> Result<(), ParsingError> {
        let namespace = dataset.namespace_for_read();
        let mut title = None;
        let mut ntax = None;
        let mut taxa = Vec::new();

        loop {
            self.byte_parser.skip_comment_and_whitespace()?;
            if self.byte_parser.is_eof() {
                return Err(ParsingError::unexpected_eof(&self.byte_parser));
            }
            if self.consume_block_end()? {
                break;
            }

            if self.byte_parser.consume_if_keyword(str_of(TITLE)) {
                title = Some(self.parse_title("TAXA")?);
            } else if self.byte_parser.consume_if_keyword(str_of(DIMENSIONS)) {
                ntax = Some(self.parse_taxa_block_ntax()?);
            } else if self.byte_parser.consume_if_keyword(str_of(TAXLABELS)) {
                taxa = self.parse_taxa_block_labels(dataset, namespace)?;
            } else {
                warn!("Skipping unsupported command in TAXA block: {}", self.byte_parser.get_context_as_string(20));
                self.skip_command()?;
            }
        }

        if let Some(ntax) = ntax
            && ntax != taxa.len()
        {
            return Err(ParsingError::invalid_taxa_block(
                &self.byte_parser,
                format!("Number of parsed labels ({}) did not match ntax value ({}).", taxa.len(), ntax),
            ));
        }

        debug!("Parsed TAXA block with {} taxa", taxa.len());
        self.taxa_blocks.push(TaxaBlock { title, namespace, taxa });
        Ok(())
    }

    /// Helper method to parse TAXA block, responsible for parsing the
    /// `DIMENSIONS` command and returning the number of taxa.
    fn parse_taxa_block_ntax(&mut self) -> Result<usize, ParsingError> {
        let parser = &mut self.byte_parser;
        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if_keyword(str_of(NTAX)) {
            return Err(ParsingError::invalid_taxa_block(parser, String::from("Expected 'NTAX' in TAXA block.")));
        }

        parser.skip_whitespace();
        if !parser.consume_if(b'=') {
            return Err(ParsingError::invalid_taxa_block(parser, String::from("Expected '=' in TAXA block.")));
        }

        parser.skip_whitespace();
        let ntax_str = parser.parse_unquoted_label(NEXUS_LABEL_DELIMITERS)?;
        let ntax: usize = ntax_str.parse().map_err(|_| {
            ParsingError::invalid_taxa_block(parser, format!("Cannot parse `ntax` value: {}", ntax_str))
        })?;

        self.expect_semicolon("TAXA")?;
        Ok(ntax)
    }

    /// Helper method to parse TAXA block, responsible for parsing `TAXLABELS` command
    /// and returning the taxa in declaration order.
    fn parse_taxa_block_labels(
        &mut self,
        dataset: &mut Dataset,
        namespace: NamespaceIndex,
    ) -> Result<Vec<TaxonIndex>, ParsingError> {
        let mut taxa = Vec::new();
        let mut seen = HashSet::new();
        loop {
            self.byte_parser.skip_comment_and_whitespace()?;

            // Stop once encountering semicolon (end of labels command)
            if self.byte_parser.consume_if(b';') {
                break;
            }
            if self.byte_parser.is_eof() {
                return Err(ParsingError::unexpected_eof(&self.byte_parser));
            }

            let label = self.byte_parser.parse_label(NEXUS_LABEL_DELIMITERS, true)?;
            let taxon = dataset.namespace_mut(namespace).get_or_insert(&label);
            if !seen.insert(taxon) {
                return Err(ParsingError::invalid_taxa_block(
                    &self.byte_parser,
                    format!("Taxon '{label}' declared twice in TAXLABELS."),
                ));
            }
            taxa.push(taxon);
        }
        Ok(taxa)
    }
}

// ============================================================================
// TREES block (private)
// ============================================================================
impl<S: ByteSource> NexusParser<S> {
    /// Parse TREES block into a new trees block of `dataset`.
    ///
    /// Resolves leaf labels of the trees based on the `TRANSLATE` command
    /// (if present), the 1-based order of the linked TAXA block, or
    /// verbatim.
    fn parse_trees_block(&mut self, dataset: &mut Dataset) -> Result<(), ParsingError> {
        let mut title = None;
        let mut link: Option<usize> = None;
        let mut binding: Option<(NamespaceIndex, Option<Vec<TaxonIndex>>)> = None;
        let mut translation = HashMap::new();
        let mut trees = Vec::new();

        loop {
            self.byte_parser.skip_comment_and_whitespace()?;
            if self.byte_parser.is_eof() {
                return Err(ParsingError::unexpected_eof(&self.byte_parser));
            }
            if self.consume_block_end()? {
                break;
            }

            if self.byte_parser.consume_if_keyword(str_of(TITLE)) {
                title = Some(self.parse_title("TREES")?);
            } else if self.byte_parser.consume_if_keyword(str_of(LINK)) {
                link = Some(self.parse_link()?);
            } else if self.byte_parser.consume_if_keyword(str_of(TRANSLATE)) {
                let (namespace, declared) = binding.get_or_insert_with(|| self.bind(dataset, link)).clone();
                translation = self.parse_translate(dataset, namespace, declared.as_deref())?;
            } else if self.byte_parser.consume_if_keyword(str_of(TREE)) {
                let (namespace, declared) = binding.get_or_insert_with(|| self.bind(dataset, link)).clone();
                let resolver = LabelResolver::NexusLabels { translation: translation.clone(), declared };
                trees.push(self.parse_tree_command(dataset, namespace, resolver, Rooting::Unknown)?);
            } else if self.byte_parser.consume_if_keyword("UTREE") {
                let (namespace, declared) = binding.get_or_insert_with(|| self.bind(dataset, link)).clone();
                let resolver = LabelResolver::NexusLabels { translation: translation.clone(), declared };
                trees.push(self.parse_tree_command(dataset, namespace, resolver, Rooting::Unrooted)?);
            } else {
                warn!("Skipping unsupported command in TREES block: {}", self.byte_parser.get_context_as_string(20));
                self.skip_command()?;
            }
        }

        let (namespace, _) = binding.unwrap_or_else(|| self.bind(dataset, link));
        debug!("Parsed TREES block with {} trees", trees.len());
        let block = dataset.add_trees_block(namespace);
        block.set_title(title);
        for tree in trees {
            block.push(tree);
        }
        Ok(())
    }

    /// Determines the namespace (and declared taxa) the trees of the current
    /// block are resolved against: the linked TAXA block, the last TAXA
    /// block, or a namespace for undeclared taxa.
    fn bind(&self, dataset: &mut Dataset, link: Option<usize>) -> (NamespaceIndex, Option<Vec<TaxonIndex>>) {
        match link.or_else(|| self.taxa_blocks.len().checked_sub(1)) {
            Some(i) => {
                let taxa_block = &self.taxa_blocks[i];
                (taxa_block.namespace, Some(taxa_block.taxa.clone()))
            }
            None => (dataset.namespace_for_read(), None),
        }
    }

    /// Parses `LINK TAXA = title;` after the keyword and returns the
    /// index of the linked TAXA block.
    fn parse_link(&mut self) -> Result<usize, ParsingError> {
        self.byte_parser.skip_comment_and_whitespace()?;
        if !self.byte_parser.consume_if_keyword(str_of(TAXA)) {
            warn!("Ignoring LINK command to other than a TAXA block");
            self.skip_command()?;
            return self.taxa_blocks.len().checked_sub(1).ok_or_else(|| {
                ParsingError::invalid_trees_block(&self.byte_parser, String::from("LINK without TAXA block."))
            });
        }

        self.byte_parser.skip_comment_and_whitespace()?;
        if !self.byte_parser.consume_if(b'=') {
            return Err(ParsingError::invalid_trees_block(
                &self.byte_parser,
                String::from("Expected '=' in LINK command."),
            ));
        }
        let title = self.byte_parser.parse_label(NEXUS_LABEL_DELIMITERS, true)?;
        self.expect_semicolon("TREES")?;

        self.taxa_blocks
            .iter()
            .rposition(|block| block.title.as_deref() == Some(title.as_str()))
            .ok_or_else(|| {
                ParsingError::unresolved_label(&self.byte_parser, format!("TAXA block '{title}'"))
            })
    }

    /// Helper method to parse TREES block, responsible for parsing `TRANSLATE` command.
    ///
    /// Keys map to taxa of the namespace; with declared taxa, each label
    /// must be one of them.
    fn parse_translate(
        &mut self,
        dataset: &mut Dataset,
        namespace: NamespaceIndex,
        declared: Option<&[TaxonIndex]>,
    ) -> Result<HashMap<String, TaxonIndex>, ParsingError> {
        let mut map = HashMap::new();
        loop {
            self.byte_parser.skip_comment_and_whitespace()?;
            if self.byte_parser.consume_if(b';') {
                break;
            }

            // Read key (short label or id) and label
            let key = self.byte_parser.parse_label(NEXUS_LABEL_DELIMITERS, true)?;
            let label = self.byte_parser.parse_label(NEXUS_LABEL_DELIMITERS, true)?;
            if key.is_empty() || label.is_empty() {
                return Err(ParsingError::invalid_trees_block(
                    &self.byte_parser,
                    String::from("Expected 'key label' pair in TRANSLATE."),
                ));
            }

            let taxa = dataset.namespace_mut(namespace);
            let taxon = match declared {
                Some(declared) => match taxa.index_of(&label) {
                    Some(taxon) if declared.contains(&taxon) => taxon,
                    _ => return Err(ParsingError::unresolved_label(&self.byte_parser, label)),
                },
                None => taxa.get_or_insert(&label),
            };
            map.insert(key, taxon);

            // Continue if next is a comma, stop if semicolon, otherwise invalid
            self.byte_parser.skip_comment_and_whitespace()?;
            if self.byte_parser.consume_if(b',') {
                continue;
            }
            if self.byte_parser.consume_if(b';') {
                break;
            }
            let next = self.byte_parser.peek().map(char::from);
            return Err(ParsingError::invalid_trees_block(
                &self.byte_parser,
                format!("Unexpected char {next:?} in TRANSLATE."),
            ));
        }
        Ok(map)
    }

    /// Parses `[*] name = [&R|&U] newick;` after the `TREE` keyword.
    fn parse_tree_command(
        &mut self,
        dataset: &mut Dataset,
        namespace: NamespaceIndex,
        resolver: LabelResolver,
        default_rooting: Rooting,
    ) -> Result<Tree, ParsingError> {
        self.byte_parser.skip_comment_and_whitespace()?;
        self.byte_parser.consume_if(b'*');

        let name = self.byte_parser.parse_label(TREE_NAME_DELIMITERS, true)?;
        self.byte_parser.skip_comment_and_whitespace()?;
        if !self.byte_parser.consume_if(b'=') {
            return Err(ParsingError::invalid_trees_block(
                &self.byte_parser,
                String::from("Expected '=' in TREE command."),
            ));
        }

        let mut tree = self
            .newick_parser
            .set_resolver(resolver)
            .set_default_rooting(default_rooting)
            .parse_str(&mut self.byte_parser, dataset.namespace_mut(namespace))?;
        if !name.is_empty() {
            tree.set_name(Some(name));
        }
        Ok(tree)
    }
}

/// Keywords are stored as bytes for writing; matching takes `&str`.
fn str_of(keyword: &[u8]) -> &str {
    std::str::from_utf8(keyword).unwrap_or_default()
}
