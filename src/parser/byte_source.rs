//! Byte source abstraction for parsing.
//!
//! This module provides the [ByteSource] trait and the [InMemoryByteSource]
//! implementation, which holds a whole input (file, string or stream) in
//! memory while a parser walks over it.

// =#========================================================================#=
// BYTE SOURCE (Trait)
// =#========================================================================#=
/// Trait defining the interface for byte sources used by
/// [ByteParser](crate::parser::ByteParser).
pub trait ByteSource {
    /// Peek at the current byte without consuming it.
    ///
    /// # Returns
    /// * `Some(u8)` - The current byte if available
    /// * `None` - If at end of data (EOF)
    fn peek(&self) -> Option<u8>;

    /// Get the current byte and advance the position (consume it).
    fn next_byte(&mut self) -> Option<u8>;

    /// Returns the current byte offset in the stream.
    fn position(&self) -> usize;

    /// Sets the position in the byte stream.
    fn set_position(&mut self, pos: usize);

    /// Returns a slice of bytes from a start position to the current position,
    /// or `None` if not available.
    fn slice_from(&self, start: usize) -> Option<&[u8]>;

    /// Returns a slice of up to `k` bytes from the current position without
    /// allocating (fewer if EOF is reached).
    fn peek_slice(&self, k: usize) -> &[u8];

    /// Returns the 1-based line and column of the current position.
    fn line_column(&self) -> (usize, usize);

    /// Check if at end of data.
    fn is_eof(&self) -> bool;
}

// =#========================================================================#=
// IN MEMORY BYTE SOURCE
// =#========================================================================#=
/// An in-memory byte source that owns its data.
pub struct InMemoryByteSource {
    /// The owned byte data being parsed
    input: Vec<u8>,
    /// Current position in the byte slice
    pos: usize,
}

impl InMemoryByteSource {
    /// Creates a new in-memory byte source from a Vec of bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            input: bytes,
            pos: 0,
        }
    }
}

impl ByteSource for InMemoryByteSource {
    #[inline(always)]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline(always)]
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    fn slice_from(&self, start: usize) -> Option<&[u8]> {
        if start <= self.pos && self.pos <= self.input.len() {
            Some(&self.input[start..self.pos])
        } else {
            None
        }
    }

    #[inline(always)]
    fn peek_slice(&self, k: usize) -> &[u8] {
        let start = self.pos.min(self.input.len());
        let end = (self.pos + k).min(self.input.len());
        &self.input[start..end]
    }

    fn line_column(&self) -> (usize, usize) {
        let end = self.pos.min(self.input.len());
        let consumed = &self.input[..end];
        let line = consumed.iter().filter(|&&b| b == b'\n').count() + 1;
        let column = match consumed.iter().rposition(|&b| b == b'\n') {
            Some(newline) => end - newline,
            None => end + 1,
        };
        (line, column)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let mut source = InMemoryByteSource::from_vec(b"ab\ncd\nef".to_vec());
        assert_eq!(source.line_column(), (1, 1));
        source.set_position(4);
        assert_eq!(source.line_column(), (2, 2));
        source.set_position(6);
        assert_eq!(source.line_column(), (3, 1));
    }

    #[test]
    fn test_peek_slice_at_eof() {
        let mut source = InMemoryByteSource::from_vec(b"abc".to_vec());
        source.set_position(3);
        assert!(source.peek_slice(5).is_empty());
        assert!(source.is_eof());
        assert_eq!(source.next_byte(), None);
    }
}
