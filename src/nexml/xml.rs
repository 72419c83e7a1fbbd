//! Minimal pull tokenizer for the XML subset used by NeXML files.
//!
//! Supports elements with attributes, self-closing tags, text with entity
//! and character references, and CDATA sections. Comments, processing
//! instructions and `<!DOCTYPE ...>` declarations are skipped. Namespace
//! prefixes are stripped from element and attribute names.

use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_parser::ConsumeMode::{Exclusive, Inclusive};
use crate::parser::byte_source::ByteSource;
use crate::parser::parsing_error::ParsingError;

/// Bytes ending an element or attribute name.
const NAME_DELIMITERS: &[u8] = b" \t\n\r/>=";

/// An event of the XML token stream.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum XmlEvent {
    /// `<name attr="value" ...>` or `<name ... />`
    Start {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    /// `</name>`
    End { name: String },
    /// Non-whitespace character data between tags
    Text(String),
    /// End of input
    Eof,
}

impl XmlEvent {
    /// Returns the value of an attribute of a start event.
    pub(crate) fn attribute(&self, key: &str) -> Option<&str> {
        match self {
            XmlEvent::Start { attributes, .. } => attributes
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }
}

/// Pulls [XmlEvent]s from a [ByteParser].
pub(crate) struct XmlReader<S: ByteSource> {
    parser: ByteParser<S>,
}

impl<S: ByteSource> XmlReader<S> {
    pub(crate) fn new(parser: ByteParser<S>) -> Self {
        XmlReader { parser }
    }

    /// The underlying byte parser, e.g. for error positions.
    pub(crate) fn parser(&self) -> &ByteParser<S> {
        &self.parser
    }

    /// Reads the next event, skipping comments, declarations and
    /// whitespace-only text.
    pub(crate) fn next_event(&mut self) -> Result<XmlEvent, ParsingError> {
        loop {
            if self.parser.is_eof() {
                return Ok(XmlEvent::Eof);
            }

            if self.parser.peek() != Some(b'<') {
                let text = self.read_text()?;
                if text.trim().is_empty() {
                    continue;
                }
                return Ok(XmlEvent::Text(text));
            }

            if self.parser.consume_if_sequence(b"<!--") {
                self.skip_past(b"-->")?;
            } else if self.parser.consume_if_sequence(b"<![CDATA[") {
                let start = self.parser.position();
                self.skip_past(b"]]>")?;
                let raw = self.parser.slice_from(start);
                let text = raw[..raw.len() - 3].to_vec();
                return String::from_utf8(text)
                    .map(XmlEvent::Text)
                    .map_err(|_| ParsingError::invalid_utf8(&self.parser));
            } else if self.parser.consume_if_sequence(b"<?") {
                self.skip_past(b"?>")?;
            } else if self.parser.consume_if_sequence(b"<!") {
                self.skip_past(b">")?;
            } else if self.parser.consume_if_sequence(b"</") {
                let name = self.read_name()?;
                self.parser.skip_whitespace();
                if !self.parser.consume_if(b'>') {
                    return Err(self.error(format!("Expected '>' to close end tag </{name}")));
                }
                return Ok(XmlEvent::End { name });
            } else {
                self.parser.next_byte(); // '<'
                return self.read_start_tag();
            }
        }
    }

    /// Skips everything up to the matching end tag of an element whose
    /// start tag (not self-closing) has just been read.
    pub(crate) fn skip_element(&mut self) -> Result<(), ParsingError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_event()? {
                XmlEvent::Start { self_closing: false, .. } => depth += 1,
                XmlEvent::End { .. } => depth -= 1,
                XmlEvent::Eof => return Err(ParsingError::unexpected_eof(&self.parser)),
                _ => {}
            }
        }
        Ok(())
    }

    pub(crate) fn error(&self, msg: String) -> ParsingError {
        ParsingError::invalid_nexml(&self.parser, msg)
    }

    fn skip_past(&mut self, sequence: &[u8]) -> Result<(), ParsingError> {
        let start = self.parser.position();
        if !self.parser.consume_until_sequence(sequence, Inclusive) {
            self.parser.set_position(start);
            return Err(ParsingError::unexpected_eof(&self.parser));
        }
        Ok(())
    }

    fn read_start_tag(&mut self) -> Result<XmlEvent, ParsingError> {
        let name = self.read_name()?;
        if name.is_empty() {
            return Err(self.error(String::from("Expected element name after '<'")));
        }

        let mut attributes = Vec::new();
        loop {
            self.parser.skip_whitespace();
            if self.parser.consume_if_sequence(b"/>") {
                return Ok(XmlEvent::Start { name, attributes, self_closing: true });
            }
            if self.parser.consume_if(b'>') {
                return Ok(XmlEvent::Start { name, attributes, self_closing: false });
            }
            if self.parser.is_eof() {
                return Err(ParsingError::unexpected_eof(&self.parser));
            }

            let qualified = self.parse_raw_name()?;
            if qualified.is_empty() {
                return Err(self.error(format!("Invalid attribute in <{name}>")));
            }
            self.parser.skip_whitespace();
            if !self.parser.consume_if(b'=') {
                return Err(self.error(format!("Expected '=' after attribute '{qualified}'")));
            }
            self.parser.skip_whitespace();
            let value = match self.parser.peek() {
                Some(quote @ (b'"' | b'\'')) => {
                    self.parser.next_byte();
                    let start = self.parser.position();
                    if !self.parser.consume_until(quote, Inclusive) {
                        self.parser.set_position(start);
                        return Err(ParsingError::unclosed_quote(&self.parser));
                    }
                    let raw = self.parser.slice_from(start);
                    let raw = raw[..raw.len() - 1].to_vec();
                    self.decode(raw, start)?
                }
                _ => return Err(self.error(format!("Expected quoted value of attribute '{qualified}'"))),
            };

            // Namespace declarations carry no data
            if qualified == "xmlns" || qualified.starts_with("xmlns:") {
                continue;
            }
            attributes.push((local_name(&qualified).to_string(), value));
        }
    }

    fn read_name(&mut self) -> Result<String, ParsingError> {
        let qualified = self.parse_raw_name()?;
        Ok(local_name(&qualified).to_string())
    }

    fn parse_raw_name(&mut self) -> Result<String, ParsingError> {
        self.parser.parse_unquoted_label(NAME_DELIMITERS)
    }

    fn read_text(&mut self) -> Result<String, ParsingError> {
        let start = self.parser.position();
        self.parser.consume_until(b'<', Exclusive);
        let raw = self.parser.slice_from(start).to_vec();
        self.decode(raw, start)
    }

    /// Decodes entity and character references of raw text.
    fn decode(&mut self, raw: Vec<u8>, start: usize) -> Result<String, ParsingError> {
        let text = String::from_utf8(raw).map_err(|_| {
            self.parser.set_position(start);
            ParsingError::invalid_utf8(&self.parser)
        })?;
        if !text.contains('&') {
            return Ok(text);
        }

        let mut decoded = String::with_capacity(text.len());
        let mut rest = text.as_str();
        while let Some(amp) = rest.find('&') {
            decoded.push_str(&rest[..amp]);
            rest = &rest[amp..];
            let Some(semi) = rest.find(';') else {
                return Err(self.error(String::from("Unterminated entity reference")));
            };
            let entity = &rest[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                    } else if let Some(dec) = entity.strip_prefix('#') {
                        dec.parse::<u32>().ok().and_then(char::from_u32)
                    } else {
                        None
                    }
                }
            };
            match c {
                Some(c) => decoded.push(c),
                None => return Err(self.error(format!("Unknown entity '&{entity};'"))),
            }
            rest = &rest[semi + 1..];
        }
        decoded.push_str(rest);
        Ok(decoded)
    }
}

/// Strips a namespace prefix: `nex:nexml` becomes `nexml`.
fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Escapes text for use in a double-quoted attribute value.
pub(crate) fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#10;"),
            '\t' => escaped.push_str("&#9;"),
            '\r' => escaped.push_str("&#13;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &str) -> Vec<XmlEvent> {
        let mut reader = XmlReader::new(ByteParser::for_str(input));
        let mut events = Vec::new();
        loop {
            let event = reader.next_event().unwrap();
            if event == XmlEvent::Eof {
                return events;
            }
            events.push(event);
        }
    }

    #[test]
    fn test_tags_attributes_and_prefixes() {
        let events = events(
            "<?xml version=\"1.0\"?><!-- c --><nex:nexml xmlns:nex='x' version=\"0.9\"><otu id='o1' label=\"A &amp; B\"/></nex:nexml>",
        );
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].attribute("version"), Some("0.9"));
        assert!(matches!(&events[1], XmlEvent::Start { name, self_closing: true, .. } if name == "otu"));
        assert_eq!(events[1].attribute("label"), Some("A & B"));
        assert_eq!(events[2], XmlEvent::End { name: String::from("nexml") });
    }

    #[test]
    fn test_character_references() {
        let events = events("<a>&#65;&#x42;&lt;</a>");
        assert_eq!(events[1], XmlEvent::Text(String::from("AB<")));
    }

    #[test]
    fn test_escape_attribute_reads_back() {
        let value = "Baillon's \"Crake\" <&>";
        let input = format!("<otu label=\"{}\"/>", escape_attribute(value));
        assert_eq!(events(&input)[0].attribute("label"), Some(value));
    }

    #[test]
    fn test_unknown_entity() {
        let mut reader = XmlReader::new(ByteParser::for_str("<a b=\"&nbsp;\"/>"));
        assert!(reader.next_event().is_err());
    }
}
