use phylosplit::parser::byte_parser::ConsumeMode::{Exclusive, Inclusive};
use phylosplit::parser::byte_parser::{ByteParser, ConsumeMode};
use phylosplit::parser::ParsingErrorType;

const DELIMITERS: &[u8] = b"(),:; \t\n\r";

#[test]
fn test_skip_whitespace() {
    let mut parser = ByteParser::for_str(" \r  \t\n \t x y");
    parser.skip_whitespace();
    assert_eq!(parser.peek(), Some(b'x'));

    parser.next_byte(); // skip x
    parser.skip_whitespace();
    assert_eq!(parser.peek(), Some(b'y'));
}

#[test]
fn test_skip_comment() {
    let mut parser = ByteParser::for_str("Tree tiny = [Following tree is tiny] ((A:1,B:1):1,C:2)");
    parser.consume_until(b'=', ConsumeMode::Inclusive);
    parser.skip_whitespace();
    assert!(parser.skip_comment().unwrap());
    assert_eq!(parser.next_byte(), Some(b' '));
    assert_eq!(parser.next_byte(), Some(b'('));
    assert!(!parser.skip_comment().unwrap());
}

#[test]
fn test_unclosed_comment() {
    let mut parser = ByteParser::for_str("[never ending");
    let err = parser.skip_comment().unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorType::UnclosedComment));
}

#[test]
fn test_skip_comment_and_whitespace() {
    let mut parser = ByteParser::for_str("[Go] \n[Keep going]   \t ['...']\n[One more to go]  END!");
    parser.skip_comment_and_whitespace().expect("Failed to skip comments.");
    assert_eq!(parser.next_byte(), Some(b'E'));
}

#[test]
fn test_consume_until_inclusive() {
    let mut parser = ByteParser::for_str("consume a CAN of beans");
    parser.consume_until(b'C', Inclusive);
    assert_eq!(parser.peek(), Some(b'A'));
    assert_eq!(parser.position(), 11);
}

#[test]
fn test_consume_until_exclusive() {
    let mut parser = ByteParser::for_str("consume a CAN of beans");
    parser.consume_until(b'C', Exclusive);
    assert_eq!(parser.peek(), Some(b'C'));
    assert_eq!(parser.position(), 10);
}

#[test]
fn test_consume_until_sequence() {
    let mut parser = ByteParser::for_str("some commands; end;");
    assert!(parser.consume_until_sequence(b"END;", Exclusive));
    assert_eq!(parser.position(), 15);
    assert!(parser.consume_until_sequence(b"END;", Inclusive));
    assert!(parser.is_eof());
    assert!(!parser.consume_until_sequence(b"END;", Inclusive));
}

#[test]
fn test_consume_if_keyword() {
    let mut parser = ByteParser::for_str("TREES; TREE t");
    assert!(!parser.consume_if_keyword("TREE"));
    assert!(parser.consume_if_keyword("trees"));
    assert_eq!(parser.peek(), Some(b';'));
}

#[test]
fn test_is_eof() {
    let mut parser = ByteParser::for_str("... happily ever after!");
    parser.consume_until(b'!', Inclusive);
    assert!(parser.is_eof());
}

#[test]
fn test_position_and_line_column() {
    let mut parser = ByteParser::for_str("Where\nare we?");
    assert_eq!(parser.position(), 0);
    parser.peek();
    assert_eq!(parser.position(), 0);
    parser.next_byte();
    assert_eq!(parser.position(), 1);

    parser.consume_until(b'a', Exclusive);
    assert_eq!(parser.line_column(), (2, 1));
}

#[test]
fn test_peek_is_word() {
    let parser = ByteParser::for_str("BEGIN TREES;");
    assert!(parser.peek_is_word("BEGIN"));
    assert!(parser.peek_is_word("beGin"));
    assert!(!parser.peek_is_word("benin"));
    // Position should not have changed (peek operation)
    assert_eq!(parser.position(), 0);
    assert_eq!(parser.peek(), Some(b'B'));
}

#[test]
fn test_parse_unquoted_label() {
    let mut parser = ByteParser::for_str("Scarabaeus:0.5");
    let label = parser.parse_unquoted_label(DELIMITERS).unwrap();
    assert_eq!(label, "Scarabaeus");
    assert_eq!(parser.peek(), Some(b':'));
}

#[test]
fn test_parse_quoted_label() {
    let mut parser = ByteParser::for_str("'Scarabaeus viettei':0.5");
    let label = parser.parse_quoted_label().unwrap();
    assert_eq!(label, "Scarabaeus viettei");
    assert_eq!(parser.peek(), Some(b':'));
}

#[test]
fn test_parse_quoted_label_with_escaped_quote() {
    let mut parser = ByteParser::for_str("'Wilson''s_storm-petrel',");
    let label = parser.parse_quoted_label().unwrap();
    assert_eq!(label, "Wilson's_storm-petrel");
    assert_eq!(parser.peek(), Some(b','));
}

#[test]
fn test_unclosed_quote() {
    let mut parser = ByteParser::for_str("'Wilson's");
    parser.parse_quoted_label().unwrap();
    let mut parser = ByteParser::for_str("'Wilson''s");
    let err = parser.parse_quoted_label().unwrap_err();
    assert!(matches!(err.kind(), ParsingErrorType::UnclosedQuote));
    assert_eq!(parser.position(), 0);
}

#[test]
fn test_parse_label_chooses_quoted() {
    let mut parser = ByteParser::for_str(" [comment] 'Quoted_label' ");
    let label = parser.parse_label(DELIMITERS, true).unwrap();
    assert_eq!(label, "Quoted_label");
}

#[test]
fn test_parse_label_chooses_unquoted() {
    let mut parser = ByteParser::for_str("  Unquoted_label:");
    let label = parser.parse_label(DELIMITERS, true).unwrap();
    assert_eq!(label, "Unquoted label");
    assert_eq!(parser.peek(), Some(b':'));
}

#[test]
fn test_get_context_as_string() {
    let mut parser = ByteParser::for_str("BEGIN TREES;");
    assert_eq!(parser.get_context_as_string(5), "BEGIN");

    parser.consume_if_word("BEGIN");
    parser.skip_whitespace();
    assert_eq!(parser.get_context_as_string(10), "TREES;");
}
