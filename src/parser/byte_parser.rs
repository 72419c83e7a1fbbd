//! Low-level byte-by-byte parser for ASCII/UTF-8 text.
//!
//! This module provides [ByteParser] for parsing text-based tree formats with
//! support for peeking, consuming, pattern matching, and quote-aware label
//! parsing. Used as the foundation of the Newick, Nexus and NeXML parsers.

use crate::parser::byte_source::{ByteSource, InMemoryByteSource};
use crate::parser::parsing_error::ParsingError;

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// A byte-by-byte parser with support for peeking, consuming, and pattern matching.
///
/// # Features
/// - Case-insensitive matching for ASCII keywords
/// - Whitespace and `[...]` comment skipping
/// - Quote-aware label parsing (single quotes with `''` escaping)
/// - Line/column and context extraction for error reporting
///
/// # Example
/// ```
/// use phylosplit::parser::ByteParser;
///
/// let mut parser = ByteParser::for_str("BEGIN TREES; [comment] TREE t1 = (A,B);");
/// assert!(parser.consume_if_word("begin"));
/// parser.skip_whitespace();
/// assert!(parser.peek_is_word("TREES"));
/// ```
pub struct ByteParser<S: ByteSource> {
    source: S,
}

impl ByteParser<InMemoryByteSource> {
    /// Creates a new `ByteParser` from a byte slice by copying it into a Vec.
    pub fn from_bytes(input: &[u8]) -> Self {
        Self::new(InMemoryByteSource::from_vec(input.to_vec()))
    }

    /// Creates a new `ByteParser` taking ownership of a byte vector.
    pub fn from_vec(input: Vec<u8>) -> Self {
        Self::new(InMemoryByteSource::from_vec(input))
    }

    /// Creates a new `ByteParser` from a string by copying it into a Vec.
    pub fn for_str(input: &str) -> Self {
        Self::from_bytes(input.as_bytes())
    }
}

impl<S: ByteSource> ByteParser<S> {
    /// Creates a new `ByteParser` from a byte source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Peeks at the current byte without consuming it.
    ///
    /// # Returns
    /// * `Some(u8)` - The current byte if available
    /// * `None` - If at end of data (EOF)
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.source.peek()
    }

    /// Gets the current byte and advances the position (consumes it).
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        self.source.next_byte()
    }

    /// Skips (consumes) all consecutive whitespace characters.
    ///
    /// Whitespace includes: space, tab, newline and carriage return.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.next_byte();
            } else {
                break;
            }
        }
    }

    /// Skips (consumes) a `[...]` comment if present.
    ///
    /// # Returns
    /// * `Ok(true)` - A comment was found and consumed
    /// * `Ok(false)` - No comment at current position
    ///
    /// # Errors
    /// Returns an error if a comment starts with `[` but doesn't have a closing `]`.
    pub fn skip_comment(&mut self) -> Result<bool, ParsingError> {
        if self.peek() != Some(b'[') {
            return Ok(false);
        }

        let start = self.position();
        self.next_byte();
        if !self.consume_until(b']', ConsumeMode::Inclusive) {
            self.set_position(start);
            return Err(ParsingError::unclosed_comment(self));
        }

        Ok(true)
    }

    /// Skips (consumes) all consecutive whitespace and `[...]` comments.
    ///
    /// # Errors
    /// Returns an error if an unclosed comment is encountered.
    pub fn skip_comment_and_whitespace(&mut self) -> Result<(), ParsingError> {
        self.skip_whitespace();

        while self.skip_comment()? {
            self.skip_whitespace();
        }

        Ok(())
    }

    /// Checks if the current byte matches the target byte (case-insensitive for ASCII).
    pub fn peek_is(&self, ch: u8) -> bool {
        matches!(self.peek(), Some(b) if b.eq_ignore_ascii_case(&ch))
    }

    /// Checks if the following bytes match the given word (case-insensitive),
    /// without changing the position.
    pub fn peek_is_word(&self, word: &str) -> bool {
        self.peek_is_sequence(word.as_bytes())
    }

    /// Checks if the following bytes match the given byte sequence (case-insensitive).
    #[inline]
    pub fn peek_is_sequence(&self, sequence: &[u8]) -> bool {
        let context = self.source.peek_slice(sequence.len());
        context.len() == sequence.len() && context.eq_ignore_ascii_case(sequence)
    }

    /// Consumes the current byte if it matches the target byte (case-insensitive).
    ///
    /// # Returns
    /// `true` if the byte was matched and consumed, `false` otherwise
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.next_byte();
            true
        } else {
            false
        }
    }

    /// Consumes the next bytes if they match the given word (case-insensitive).
    pub fn consume_if_word(&mut self, word: &str) -> bool {
        self.consume_if_sequence(word.as_bytes())
    }

    /// Consumes the next bytes if they match the given byte sequence (case-insensitive).
    ///
    /// # Returns
    /// `true` if the sequence was matched and consumed, `false` otherwise
    pub fn consume_if_sequence(&mut self, sequence: &[u8]) -> bool {
        if !self.peek_is_sequence(sequence) {
            return false;
        }

        self.source.set_position(self.position() + sequence.len());
        true
    }

    /// Consumes a keyword only if it is followed by a non-identifier byte,
    /// so that `TREE` does not match the start of `TREES`.
    pub fn consume_if_keyword(&mut self, keyword: &str) -> bool {
        if !self.peek_is_word(keyword) {
            return false;
        }

        let following = self.source.peek_slice(keyword.len() + 1).get(keyword.len()).copied();
        if matches!(following, Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            return false;
        }

        self.source.set_position(self.position() + keyword.len());
        true
    }

    /// Consumes bytes until the target byte is found.
    ///
    /// # Arguments
    /// * `target` - The byte to search for
    /// * `mode` - Whether to consume the target byte (`Inclusive`) or stop before it (`Exclusive`)
    ///
    /// # Returns
    /// `true` if the target was found, `false` if EOF was reached first
    pub fn consume_until(&mut self, target: u8, mode: ConsumeMode) -> bool {
        while let Some(b) = self.peek() {
            if b == target {
                if mode == ConsumeMode::Inclusive {
                    self.next_byte();
                }
                return true;
            }
            self.next_byte();
        }
        false
    }

    /// Consumes bytes until the next bytes match the given byte sequence (case-insensitive).
    ///
    /// # Returns
    /// `true` if the sequence was found, `false` if EOF was reached first
    pub fn consume_until_sequence(&mut self, sequence: &[u8], mode: ConsumeMode) -> bool {
        while !self.is_eof() {
            if self.peek_is_sequence(sequence) {
                if mode == ConsumeMode::Inclusive {
                    self.source.set_position(self.position() + sequence.len());
                }
                return true;
            }
            self.next_byte();
        }
        false
    }

    /// Returns whether the end of data (EOF) has been reached.
    pub fn is_eof(&self) -> bool {
        self.source.is_eof()
    }

    /// Returns the current byte offset in the input.
    pub fn position(&self) -> usize {
        self.source.position()
    }

    /// Sets the position in the byte stream.
    pub fn set_position(&mut self, pos: usize) {
        self.source.set_position(pos);
    }

    /// Returns the 1-based line and column of the current position.
    pub fn line_column(&self) -> (usize, usize) {
        self.source.line_column()
    }

    /// Returns a slice of the input from a start position to the current position.
    pub fn slice_from(&self, start: usize) -> &[u8] {
        self.source.slice_from(start).unwrap_or(&[])
    }

    /// Returns a string from up to `k` bytes from the current position for error context.
    ///
    /// Invalid UTF-8 sequences are replaced with the Unicode replacement character.
    pub fn get_context_as_string(&self, k: usize) -> String {
        String::from_utf8_lossy(self.source.peek_slice(k)).into_owned()
    }

    /// Parses a label (quoted or unquoted) with the given delimiter set.
    ///
    /// Quoted labels are returned verbatim (apart from `''` unescaping).
    /// In unquoted labels, underscores are turned into spaces if
    /// `underscores_to_spaces` is set.
    ///
    /// # Errors
    /// Returns an error if a quoted label is not closed or a label is not
    /// valid UTF-8.
    pub fn parse_label(
        &mut self,
        delimiters: &[u8],
        underscores_to_spaces: bool,
    ) -> Result<String, ParsingError> {
        self.skip_comment_and_whitespace()?;

        if self.peek() == Some(b'\'') {
            self.parse_quoted_label()
        } else {
            let label = self.parse_unquoted_label(delimiters)?;
            if underscores_to_spaces {
                Ok(label.replace('_', " "))
            } else {
                Ok(label)
            }
        }
    }

    /// Parses a label enclosed in single quotes, where single quotes within
    /// the label are escaped by doubling them (`'Wilson''s'` becomes `Wilson's`).
    ///
    /// Assumes the opening quote has not been consumed yet.
    pub fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        self.parse_quoted(b'\'')
    }

    /// Parses text enclosed in the given quote byte, where the quote byte
    /// itself is escaped by doubling it.
    pub fn parse_quoted(&mut self, quote: u8) -> Result<String, ParsingError> {
        let start = self.position();
        self.next_byte();

        let mut bytes = Vec::new();
        loop {
            match self.next_byte() {
                Some(b) if b == quote => {
                    if self.peek() == Some(quote) {
                        bytes.push(quote);
                        self.next_byte();
                    } else {
                        break;
                    }
                }
                Some(b) => bytes.push(b),
                None => {
                    self.set_position(start);
                    return Err(ParsingError::unclosed_quote(self));
                }
            }
        }

        self.bytes_to_string(bytes, start)
    }

    /// Parses an unquoted label until any of the given delimiters (or EOF)
    /// is encountered.
    pub fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        let start = self.position();
        while let Some(b) = self.peek() {
            if delimiters.contains(&b) {
                break;
            }
            self.next_byte();
        }

        let bytes = self.slice_from(start).to_vec();
        self.bytes_to_string(bytes, start)
    }

    fn bytes_to_string(&mut self, bytes: Vec<u8>, start: usize) -> Result<String, ParsingError> {
        String::from_utf8(bytes).map_err(|_| {
            self.set_position(start);
            ParsingError::invalid_utf8(self)
        })
    }
}

/// Specifies whether to consume or leave the target when using `consume_until` methods.
///
/// # Examples
/// ```
/// use phylosplit::parser::{ByteParser, ConsumeMode};
///
/// let mut parser = ByteParser::for_str("TREE t1=((A:0.5,B:0.5):0.3,C:0.8):0.0");
///
/// // Inclusive: consume up to and including '='
/// parser.consume_until(b'=', ConsumeMode::Inclusive);
/// assert_eq!(parser.peek(), Some(b'('));
///
/// let mut parser = ByteParser::for_str("('Wilson''s_Storm-petrel')");
///
/// // Exclusive: stop in front of the quote
/// parser.consume_until(b'\'', ConsumeMode::Exclusive);
/// assert_eq!(parser.peek(), Some(b'\''));
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ConsumeMode {
    /// Consume the target byte/sequence along with everything before it.
    Inclusive,

    /// Stop before the target byte/sequence without consuming it.
    Exclusive,
}
