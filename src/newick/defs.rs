//! Constants for Newick parsing and writing.

/// Newick label delimiters: parentheses, brackets, comma, colon, semicolon, whitespace
pub(crate) const NEWICK_LABEL_DELIMITERS: &[u8] = b"([,:; \n\t\r)]";

/// Bytes that end a node suffix (after label, annotations and branch length)
pub(crate) const NEWICK_NODE_END: &[u8] = b",);";

/// Start of an annotation comment
pub(crate) const ANNOTATION_START: &[u8] = b"[&";

/// Rooting comment of rooted trees
pub(crate) const ROOTED_TOKEN: &[u8] = b"[&R]";

/// Rooting comment of unrooted trees
pub(crate) const UNROOTED_TOKEN: &[u8] = b"[&U]";

/// Annotation value delimiters
pub(crate) const ANNOTATION_VALUE_DELIMITERS: &[u8] = b",]";
