//! XML Name and Nmtoken lexical checks
//!
//! Character classes follow XML 1.0 (Fifth Edition) NameStartChar/NameChar.
//! These are the black-box lexical checks behind ID, IDREF, ENTITY and
//! NMTOKEN attribute values.

use memchr::memchr;

/// Check if a codepoint is an XML NameStartChar
#[inline]
pub fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}' |
        '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}'
    )
}

/// Check if a codepoint is an XML NameChar
#[inline]
pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// `Name ::= NameStartChar (NameChar)*`
pub fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_name_start_char(c) => chars.all(is_name_char),
        _ => false,
    }
}

/// `Nmtoken ::= (NameChar)+`
pub fn is_nmtoken(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_name_char)
}

/// XML white space: #x20 | #x9 | #xD | #xA
#[inline]
pub fn is_xml_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// True if the text is empty or consists only of XML white space
pub fn is_all_whitespace(text: &str) -> bool {
    text.bytes().all(is_xml_whitespace)
}

/// Split a space-separated list value into its tokens
pub fn split_tokens(value: &str) -> impl Iterator<Item = &str> {
    value.split(' ').filter(|t| !t.is_empty())
}

/// Normalize a non-CDATA attribute value: drop leading and trailing spaces
/// and collapse every run of spaces to a single one.
///
/// Returns `None` when the value is already normalized.
pub fn normalize_spaces(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    // Fast path: no space at all means nothing to collapse
    if memchr(b' ', bytes).is_none() {
        return None;
    }

    let mut out = String::with_capacity(value.len());
    for token in split_tokens(value) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }

    if out == value {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert!(is_name("a"));
        assert!(is_name("_x.y-z"));
        assert!(is_name("ns:local"));
        assert!(is_name("\u{e9}t\u{e9}"));
        assert!(!is_name(""));
        assert!(!is_name("1abc"));
        assert!(!is_name("-a"));
        assert!(!is_name("a b"));
    }

    #[test]
    fn test_nmtokens() {
        assert!(is_nmtoken("123"));
        assert!(is_nmtoken("-a.b"));
        assert!(!is_nmtoken(""));
        assert!(!is_nmtoken("a b"));
        assert!(!is_nmtoken("a&b"));
    }

    #[test]
    fn test_normalize_spaces() {
        assert_eq!(normalize_spaces("abc"), None);
        assert_eq!(normalize_spaces("a b"), None);
        assert_eq!(normalize_spaces("  a   b "), Some("a b".to_string()));
        assert_eq!(normalize_spaces(" x"), Some("x".to_string()));
        assert_eq!(normalize_spaces("   "), Some(String::new()));
    }

    #[test]
    fn test_whitespace() {
        assert!(is_all_whitespace(" \n\t\r"));
        assert!(is_all_whitespace(""));
        assert!(!is_all_whitespace(" x "));
        let tokens: Vec<_> = split_tokens(" a  b c ").collect();
        assert_eq!(tokens, vec!["a", "b", "c"]);
    }
}
