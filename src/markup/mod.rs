//! Fragment markup: tokenizer, reader, attribute escaping.

pub mod reader;
pub mod tokenizer;

use std::borrow::Cow;

pub use reader::{parse_markup, Attribute, Element, MarkupError, MarkupEvent, Position};

/// Escape a string for use inside a double-quoted attribute value.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Decode predefined entities and numeric character references.
///
/// On failure returns the offending entity text, `&` through `;` (or to the
/// end of input when unterminated).
pub fn unescape(value: &str) -> Result<Cow<'_, str>, String> {
    if !value.contains('&') {
        return Ok(Cow::Borrowed(value));
    }
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            return Err(tail.to_owned());
        };
        let entity = &tail[..=semi];
        let decoded = match &entity[1..semi] {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            body => numeric_reference(body),
        };
        match decoded {
            Some(ch) => out.push(ch),
            None => return Err(entity.to_owned()),
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    Ok(Cow::Owned(out))
}

/// `#65` or `#x41` to a char.
fn numeric_reference(body: &str) -> Option<char> {
    let digits = body.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_plain_is_borrowed() {
        assert!(matches!(escape_attribute("File"), Cow::Borrowed("File")));
    }

    #[test]
    fn escape_special_characters() {
        assert_eq!(escape_attribute(r#"<a & "b">'"#), "&lt;a &amp; &quot;b&quot;&gt;&apos;");
    }

    #[test]
    fn unescape_inverts_escape() {
        let original = r#"Save & "Close" <now>"#;
        let escaped = escape_attribute(original);
        assert_eq!(unescape(&escaped).unwrap(), original);
    }

    #[test]
    fn unescape_numeric() {
        assert_eq!(unescape("&#65;&#x263A;").unwrap(), "A\u{263A}");
    }

    #[test]
    fn unescape_rejects_unknown_and_unterminated() {
        assert_eq!(unescape("a &nbsp; b").unwrap_err(), "&nbsp;");
        assert_eq!(unescape("a & b").unwrap_err(), "& b");
        assert_eq!(unescape("&#xZZ;").unwrap_err(), "&#xZZ;");
    }
}
