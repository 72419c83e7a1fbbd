//! Structs and logic to parse Newick strings.
//!
//! This module provides the [NewickParser] struct, which parses single
//! trees or whole files of trees into [Tree]s bound to a [TaxonNamespace].

use crate::model::annotation::{AnnotationValue, Annotations};
use crate::model::label_resolver::LabelResolver;
use crate::model::node::{BranchLength, NodeIndex};
use crate::model::taxon_namespace::{TaxonIndex, TaxonNamespace};
use crate::model::tree::{Rooting, Tree};
use crate::newick::defs::*;
use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::ByteSource;
use crate::parser::parsing_error::ParsingError;
use log::trace;
use std::collections::HashSet;

// =#========================================================================#=
// NEWICK PARSER
// =#========================================================================#=
/// Parser (configuration) for Newick trees.
///
/// Leaf labels are resolved to taxa by a [LabelResolver]; by default every
/// new label is registered in the namespace handed to the parse methods.
///
/// # Configuration
/// * [`with_preserve_underscores()`](Self::with_preserve_underscores)
///     - Keeps underscores in unquoted labels instead of turning them into spaces.
/// * [`without_annotations()`](Self::without_annotations)
///     - Treats `[&key=value,...]` blocks as plain comments.
/// * [`with_default_rooting(rooting)`](Self::with_default_rooting)
///     - Rooting of trees without `[&R]`/`[&U]` statement.
///
/// # Parsing
/// * [`parse_str`](Self::parse_str) — Parse a single tree
/// * [`parse_all`](Self::parse_all) — Parse all trees until EOF
///
/// # Example
/// ```
/// use phylosplit::model::TaxonNamespace;
/// use phylosplit::newick::NewickParser;
/// use phylosplit::parser::ByteParser;
///
/// let input = "[&R] ((A_meleagrides:1.0,A_vulturinum:1.0):0.5,(N_meleagris:1.0,G_plumifera:1.0):0.5);";
/// let mut byte_parser = ByteParser::for_str(input);
/// let mut taxa = TaxonNamespace::new();
///
/// let tree = NewickParser::new().parse_str(&mut byte_parser, &mut taxa).unwrap();
/// assert!(tree.is_rooted());
/// assert_eq!(taxa.label(0), Some("A meleagrides"));
/// ```
#[derive(Debug, Clone)]
pub struct NewickParser {
    resolver: LabelResolver,
    underscores_to_spaces: bool,
    parse_annotations: bool,
    default_rooting: Rooting,
}

/// Per-tree parsing state.
struct TreeContext {
    tree: Tree,
    seen_taxa: HashSet<TaxonIndex>,
}

impl Default for NewickParser {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Construction & Configuration (pub)
// ============================================================================
impl NewickParser {
    /// Creates a new [NewickParser] with verbatim label resolution,
    /// annotation parsing, and underscore-to-space conversion.
    pub fn new() -> Self {
        NewickParser {
            resolver: LabelResolver::VerbatimLabels,
            underscores_to_spaces: true,
            parse_annotations: true,
            default_rooting: Rooting::Unknown,
        }
    }

    /// Keeps underscores in unquoted labels.
    pub fn with_preserve_underscores(mut self) -> Self {
        self.underscores_to_spaces = false;
        self
    }

    /// Skips `[&key=value,...]` annotations like any other comment.
    pub fn without_annotations(mut self) -> Self {
        self.parse_annotations = false;
        self
    }

    /// Sets the rooting of trees that carry no rooting comment.
    pub fn with_default_rooting(mut self, rooting: Rooting) -> Self {
        self.default_rooting = rooting;
        self
    }

    /// Replaces the label resolver, e.g. with one configured from a Nexus
    /// `TRANSLATE` command.
    pub fn with_resolver(mut self, resolver: LabelResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub(crate) fn set_resolver(&mut self, resolver: LabelResolver) -> &mut Self {
        self.resolver = resolver;
        self
    }

    pub(crate) fn set_default_rooting(&mut self, rooting: Rooting) -> &mut Self {
        self.default_rooting = rooting;
        self
    }
}

// ============================================================================
// API Parsing (pub)
// ============================================================================
impl NewickParser {
    /// Parses all Newick trees from the byte source until EOF.
    ///
    /// # Arguments
    /// * `byte_parser` - A byte parser whose source contains only Newick
    ///   strings, whitespace, and `[...]` comments
    /// * `namespace` - Namespace the leaves are resolved against
    ///
    /// # Errors
    /// Returns the [ParsingError] of the first tree that fails to parse.
    /// Taxa registered before the failure stay registered.
    pub fn parse_all<B: ByteSource>(
        &mut self,
        byte_parser: &mut ByteParser<B>,
        namespace: &mut TaxonNamespace,
    ) -> Result<Vec<Tree>, ParsingError> {
        let mut trees = Vec::new();
        loop {
            // Rooting tokens are comments too, so they must be read here
            let rooting = self.parse_rooting(byte_parser)?;
            if byte_parser.is_eof() {
                break;
            }
            trees.push(self.parse_tree_body(byte_parser, namespace, rooting)?);
        }
        Ok(trees)
    }

    /// Parses a single Newick tree, including its leading rooting comment
    /// and the terminating `;`.
    pub fn parse_str<B: ByteSource>(
        &mut self,
        parser: &mut ByteParser<B>,
        namespace: &mut TaxonNamespace,
    ) -> Result<Tree, ParsingError> {
        let rooting = self.parse_rooting(parser)?;
        if parser.is_eof() {
            return Err(ParsingError::unexpected_eof(parser));
        }
        self.parse_tree_body(parser, namespace, rooting)
    }
}

// ============================================================================
// Parsing (private)
// ============================================================================
impl NewickParser {
    /// Parses the tree following its rooting comments, up to and including `;`.
    fn parse_tree_body<B: ByteSource>(
        &self,
        parser: &mut ByteParser<B>,
        namespace: &mut TaxonNamespace,
        rooting: Option<Rooting>,
    ) -> Result<Tree, ParsingError> {
        let rooting = rooting.unwrap_or(self.default_rooting);
        let mut ctx = TreeContext {
            tree: Tree::new().with_rooting(rooting),
            seen_taxa: HashSet::new(),
        };
        let root = self.parse_node(parser, namespace, &mut ctx)?;

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b';') {
            let next_char = parser.peek().map(char::from);
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected ';' at end of tree but found {:?}", next_char),
            ));
        }

        ctx.tree.set_root(root);
        trace!("Parsed tree with {} nodes", ctx.tree.num_nodes());
        Ok(ctx.tree)
    }

    /// Skips whitespace and comments in front of a tree and returns the
    /// rooting stated by a `[&R]` or `[&U]` comment, if any.
    fn parse_rooting<B: ByteSource>(
        &self,
        parser: &mut ByteParser<B>,
    ) -> Result<Option<Rooting>, ParsingError> {
        let mut rooting = None;
        loop {
            parser.skip_whitespace();
            if parser.consume_if_sequence(ROOTED_TOKEN) {
                rooting = Some(Rooting::Rooted);
            } else if parser.consume_if_sequence(UNROOTED_TOKEN) {
                rooting = Some(Rooting::Unrooted);
            } else if !parser.skip_comment()? {
                return Ok(rooting);
            }
        }
    }

    /// Parses a node (internal node or leaf) with its suffix and returns its index.
    fn parse_node<B: ByteSource>(
        &self,
        parser: &mut ByteParser<B>,
        namespace: &mut TaxonNamespace,
        ctx: &mut TreeContext,
    ) -> Result<NodeIndex, ParsingError> {
        parser.skip_comment_and_whitespace()?;
        if parser.peek() == Some(b'(') {
            self.parse_internal_node(parser, namespace, ctx)
        } else {
            self.parse_leaf(parser, namespace, ctx)
        }
    }

    /// Parses `(child, ..., child)[label][suffix]`.
    fn parse_internal_node<B: ByteSource>(
        &self,
        parser: &mut ByteParser<B>,
        namespace: &mut TaxonNamespace,
        ctx: &mut TreeContext,
    ) -> Result<NodeIndex, ParsingError> {
        parser.next_byte(); // consume '('

        let mut children = Vec::new();
        loop {
            children.push(self.parse_node(parser, namespace, ctx)?);

            parser.skip_comment_and_whitespace()?;
            match parser.next_byte() {
                Some(b',') => continue,
                Some(b')') => break,
                Some(other) => {
                    parser.set_position(parser.position() - 1);
                    return Err(ParsingError::invalid_newick_string(
                        parser,
                        format!("Expected ',' or ')' after child but found {:?}", char::from(other)),
                    ));
                }
                None => return Err(ParsingError::unexpected_eof(parser)),
            }
        }

        // Optional internal label directly after ')'
        parser.skip_whitespace();
        let label = match parser.peek() {
            Some(b) if !NEWICK_LABEL_DELIMITERS.contains(&b) || b == b'\'' => {
                Some(parser.parse_label(NEWICK_LABEL_DELIMITERS, self.underscores_to_spaces)?)
            }
            _ => None,
        };

        let (annotations, branch_length) = self.parse_suffix(parser)?;
        let index = ctx.tree.add_internal(children, branch_length);
        let node = ctx.tree.node_mut(index);
        node.set_label(label);
        node.set_annotations(annotations);

        Ok(index)
    }

    /// Parses `label[suffix]` of a leaf and resolves the label to a taxon.
    fn parse_leaf<B: ByteSource>(
        &self,
        parser: &mut ByteParser<B>,
        namespace: &mut TaxonNamespace,
        ctx: &mut TreeContext,
    ) -> Result<NodeIndex, ParsingError> {
        let is_quoted = parser.peek() == Some(b'\'');
        let label_start = parser.position();
        let label = parser.parse_label(NEWICK_LABEL_DELIMITERS, self.underscores_to_spaces)?;
        if label.is_empty() && !is_quoted {
            let next_char = parser.peek().map(char::from);
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected leaf label but found {:?}", next_char),
            ));
        }

        let taxon = self
            .resolver
            .resolve(&label, namespace)
            .map_err(|msg| ParsingError::unresolved_label(parser, msg))?;
        if !ctx.seen_taxa.insert(taxon) {
            parser.set_position(label_start);
            return Err(ParsingError::invalid_tree_structure(
                parser,
                format!("Taxon '{}' occurs more than once in the tree", &namespace[taxon]),
            ));
        }

        let (annotations, branch_length) = self.parse_suffix(parser)?;
        let index = ctx.tree.add_leaf(taxon, branch_length);
        ctx.tree.node_mut(index).set_annotations(annotations);

        Ok(index)
    }

    /// Parses the node suffix `[annotations][:branch_length[annotations]]`,
    /// with comments allowed in between.
    fn parse_suffix<B: ByteSource>(
        &self,
        parser: &mut ByteParser<B>,
    ) -> Result<(Annotations, Option<BranchLength>), ParsingError> {
        let mut annotations = Annotations::new();
        self.skip_collecting_annotations(parser, &mut annotations)?;

        let mut branch_length = None;
        if parser.consume_if(b':') {
            self.skip_collecting_annotations(parser, &mut annotations)?;
            branch_length = Some(self.parse_branch_length(parser)?);
            self.skip_collecting_annotations(parser, &mut annotations)?;
        }

        match parser.peek() {
            Some(b) if NEWICK_NODE_END.contains(&b) => Ok((annotations, branch_length)),
            None => Err(ParsingError::unexpected_eof(parser)),
            Some(b) => Err(ParsingError::invalid_newick_string(
                parser,
                format!("Unexpected {:?} after node", char::from(b)),
            )),
        }
    }

    /// Skips whitespace and comments; `[&...]` comments are parsed into
    /// `annotations` if annotation parsing is enabled.
    fn skip_collecting_annotations<B: ByteSource>(
        &self,
        parser: &mut ByteParser<B>,
        annotations: &mut Annotations,
    ) -> Result<(), ParsingError> {
        loop {
            parser.skip_whitespace();
            if self.parse_annotations && parser.peek_is_sequence(ANNOTATION_START) {
                parse_annotation_block(parser, annotations)?;
            } else if !parser.skip_comment()? {
                return Ok(());
            }
        }
    }

    /// Parses a branch length (supports scientific notation, e.g. `1.5e-10`).
    fn parse_branch_length<B: ByteSource>(
        &self,
        parser: &mut ByteParser<B>,
    ) -> Result<BranchLength, ParsingError> {
        let start = parser.position();
        while let Some(b) = parser.peek() {
            if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
                parser.next_byte();
            } else {
                break;
            }
        }

        let text = String::from_utf8_lossy(parser.slice_from(start)).into_owned();
        text.parse::<f64>()
            .ok()
            .and_then(BranchLength::new)
            .ok_or_else(|| {
                parser.set_position(start);
                ParsingError::invalid_newick_string(parser, format!("Invalid branch length: '{text}'"))
            })
    }
}

// ============================================================================
// Annotations
// ============================================================================
/// Parses an annotation block `[&key=value,...]` into `annotations`.
///
/// Values are quoted strings (`"..."`, with `""` as escaped quote),
/// brace lists (`{0.1,0.2}`, kept verbatim as string), or bare values
/// whose type is inferred ([AnnotationValue::infer]).
pub(crate) fn parse_annotation_block<B: ByteSource>(
    parser: &mut ByteParser<B>,
    annotations: &mut Annotations,
) -> Result<(), ParsingError> {
    let start = parser.position();
    parser.consume_if_sequence(ANNOTATION_START);

    loop {
        parser.skip_whitespace();
        let key = parser.parse_unquoted_label(b"=,]")?.trim().to_string();
        if key.is_empty() {
            return Err(ParsingError::invalid_newick_string(
                parser,
                "Empty annotation key".to_string(),
            ));
        }
        if !parser.consume_if(b'=') {
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected '=' after annotation key '{key}'"),
            ));
        }

        parser.skip_whitespace();
        let value = parse_annotation_value(parser)?;
        annotations.insert(key, value);

        parser.skip_whitespace();
        match parser.next_byte() {
            Some(b',') => continue,
            Some(b']') => return Ok(()),
            Some(_) => {
                parser.set_position(parser.position() - 1);
                return Err(ParsingError::invalid_newick_string(
                    parser,
                    "Expected ',' or ']' in annotation block".to_string(),
                ));
            }
            None => {
                parser.set_position(start);
                return Err(ParsingError::unclosed_comment(parser));
            }
        }
    }
}

fn parse_annotation_value<B: ByteSource>(
    parser: &mut ByteParser<B>,
) -> Result<AnnotationValue, ParsingError> {
    match parser.peek() {
        Some(b'"') => Ok(AnnotationValue::String(parser.parse_quoted(b'"')?)),
        Some(b'{') => {
            let start = parser.position();
            let mut depth = 0usize;
            while let Some(b) = parser.next_byte() {
                match b {
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            let text = String::from_utf8_lossy(parser.slice_from(start)).into_owned();
                            return Ok(AnnotationValue::String(text));
                        }
                    }
                    _ => {}
                }
            }
            parser.set_position(start);
            Err(ParsingError::unclosed_comment(parser))
        }
        _ => {
            let text = parser.parse_unquoted_label(ANNOTATION_VALUE_DELIMITERS)?;
            let text = text.trim();
            if text.is_empty() {
                return Err(ParsingError::invalid_newick_string(
                    parser,
                    "Empty annotation value".to_string(),
                ));
            }
            Ok(AnnotationValue::infer(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<(Tree, TaxonNamespace), ParsingError> {
        let mut taxa = TaxonNamespace::new();
        let mut parser = ByteParser::for_str(input);
        let tree = NewickParser::new().parse_str(&mut parser, &mut taxa)?;
        Ok((tree, taxa))
    }

    #[test]
    fn test_polytomy_and_internal_labels() {
        let (tree, taxa) = parse("((A,B,C)95:0.1,D)root;").unwrap();
        assert_eq!(taxa.len(), 4);
        let root = tree.root().unwrap();
        assert_eq!(root.label(), Some("root"));
        let abc = tree.node(root.children()[0]);
        assert_eq!(abc.children().len(), 3);
        assert_eq!(abc.label(), Some("95"));
        assert_eq!(*abc.branch_length().unwrap(), 0.1);
    }

    #[test]
    fn test_annotations_before_and_after_length() {
        let (tree, _) = parse("(A[&rate=0.5]:1,B:[&rate=2,col=\"dark red\"]2);").unwrap();
        let a = tree.node(0);
        let b = tree.node(1);
        assert_eq!(a.annotations().get("rate"), Some(&AnnotationValue::Float(0.5)));
        assert_eq!(b.annotations().get("rate"), Some(&AnnotationValue::Int(2)));
        assert_eq!(
            b.annotations().get("col"),
            Some(&AnnotationValue::String("dark red".to_string()))
        );
    }

    #[test]
    fn test_brace_annotation_kept_verbatim() {
        let (tree, _) = parse("(A[&range={0.1,0.2}],B);").unwrap();
        assert_eq!(
            tree.node(0).annotations().get("range"),
            Some(&AnnotationValue::String("{0.1,0.2}".to_string()))
        );
    }

    #[test]
    fn test_missing_leaf_label() {
        assert!(parse("(A,);").is_err());
        assert!(parse(";").is_err());
    }

    #[test]
    fn test_duplicate_taxon() {
        let err = parse("(A,(B,A));").unwrap_err();
        assert!(matches!(err.kind(), crate::parser::ParsingErrorType::InvalidTreeStructure(_)));
    }

    #[test]
    fn test_single_leaf_tree() {
        let (tree, taxa) = parse("A:0.5;").unwrap();
        assert_eq!(tree.num_nodes(), 1);
        assert_eq!(taxa.labels(), &["A"]);
        assert!(tree.is_valid());
    }
}
