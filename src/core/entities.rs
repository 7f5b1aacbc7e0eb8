//! Entity Decoding
//!
//! Recognizes exactly four named references: `&lt;` `&gt;` `&amp;` `&auml;`.
//! Any other `&` sequence is copied through unchanged.
//!
//! Uses Cow for zero-copy when no entities are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode text content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
#[inline]
pub fn decode_text(input: &str) -> Cow<'_, str> {
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_entities(input))
}

/// Decode all entity references in the input
fn decode_entities(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        result.push_str(&rest[..amp]);
        rest = &rest[amp..];

        match decode_entity(rest) {
            Some((decoded, len)) => {
                result.push(decoded);
                rest = &rest[len..];
            }
            None => {
                // Unknown entity, keep the ampersand and move on
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Decode a single entity at the start of `input` (which begins with '&').
/// Returns the character and the number of bytes consumed.
fn decode_entity(input: &str) -> Option<(char, usize)> {
    const TABLE: [(&str, char); 4] = [("&lt;", '<'), ("&gt;", '>'), ("&amp;", '&'), ("&auml;", 'ä')];

    TABLE
        .iter()
        .find(|(entity, _)| input.starts_with(entity))
        .map(|&(entity, c)| (c, entity.len()))
}

/// Encode text for output (escape the characters the decoder understands)
pub fn encode_text(input: &str) -> Cow<'_, str> {
    if !input.bytes().any(|b| matches!(b, b'<' | b'>' | b'&')) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Encode and quote an attribute value.
///
/// There is no `&quot;`, so a value containing `"` is wrapped in single
/// quotes instead.
pub fn quote_attribute(input: &str) -> String {
    let quote = if input.contains('"') { '\'' } else { '"' };
    format!("{quote}{}{quote}", encode_text(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode_text("Hello, World!");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        assert_eq!(decode_text("a &lt;b&gt; c &amp; d"), "a <b> c & d");
    }

    #[test]
    fn test_auml() {
        assert_eq!(decode_text("K&auml;se"), "Käse");
    }

    #[test]
    fn test_unknown_entity() {
        assert_eq!(decode_text("&foo;"), "&foo;");
        assert_eq!(decode_text("&quot;x&quot;"), "&quot;x&quot;");
        assert_eq!(decode_text("&#65;"), "&#65;");
    }

    #[test]
    fn test_bare_ampersand() {
        assert_eq!(decode_text("fish & chips &"), "fish & chips &");
        assert_eq!(decode_text("&&lt;"), "&<");
    }

    #[test]
    fn test_quote_attribute() {
        assert_eq!(quote_attribute("a<b"), "\"a&lt;b\"");
        assert_eq!(quote_attribute("say \"hi\""), "'say \"hi\"'");
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text("<hello> & world"), "&lt;hello&gt; &amp; world");
        assert!(matches!(encode_text("plain"), Cow::Borrowed(_)));
    }
}
