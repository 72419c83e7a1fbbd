//! Label escaping for the Newick and Nexus formats.
//!
//! Labels are written so that reading them back yields exactly the same
//! string: unquoted labels turn underscores into spaces when read, so any
//! label containing an underscore (or punctuation) is written single-quoted.

/// Returns whether a label has to be wrapped in single quotes when written.
///
/// # Examples
/// ```
/// # use phylosplit::parser::utils::needs_quoting;
/// assert!(!needs_quoting("Pukeko"));
/// assert!(!needs_quoting("Australasian Swamphen"));
/// assert!(needs_quoting("Australasian_Swamphen"));
/// assert!(needs_quoting("Pu[ke]ko"));
/// assert!(needs_quoting(""));
/// ```
pub fn needs_quoting(label: &str) -> bool {
    label.is_empty()
        || label.chars().any(|c| {
            matches!(
                c,
                '(' | ')' | '[' | ']' | '{' | '}' | ',' | ';' | ':' | '=' | '\'' | '"' | '_'
            ) || (c.is_whitespace() && c != ' ')
        })
}

/// Escapes a label for safe use in Nexus and Newick formats.
///
/// Labels that [need quoting](needs_quoting) are wrapped in single quotes
/// with internal single quotes doubled. Otherwise spaces are replaced with
/// underscores.
///
/// # Examples
/// ```
/// # use phylosplit::parser::utils::escape_label;
/// assert_eq!(escape_label("Pukeko"), "Pukeko");
/// assert_eq!(escape_label("Pu[ke]ko"), "'Pu[ke]ko'");
/// assert_eq!(escape_label("Australasian Swamphen"), "Australasian_Swamphen");
/// assert_eq!(escape_label("Australasian_Swamphen"), "'Australasian_Swamphen'");
/// assert_eq!(escape_label("Baillon's Crake"), "'Baillon''s Crake'");
/// ```
pub fn escape_label(label: &str) -> String {
    if needs_quoting(label) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.replace(' ', "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ByteParser;

    #[test]
    fn test_escaped_labels_read_back_unchanged() {
        let labels = [
            "Pukeko",
            "Little Spotted Kiwi",
            "Apteryx_owenii",
            "Wilson's Storm-petrel",
            "a(b)c",
            "tab\there",
            "",
        ];
        for label in labels {
            let escaped = escape_label(label);
            let mut parser = ByteParser::for_str(&escaped);
            let read = parser.parse_label(b",;) \t\n\r", true).unwrap();
            assert_eq!(read, label, "escaped as {escaped}");
        }
    }
}
