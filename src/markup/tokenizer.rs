//! logos-based tokenizer for fragment markup.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins (e.g. `<!-- x -->` as Comment beats `<` as TagOpen)
//! 2. For equal length matches, earlier-defined variants win
//!
//! Character data is not a token: anything outside a tag other than
//! whitespace either lexes as a stray `Name` or fails to lex, and the reader
//! reports both as unexpected text.

use logos::Logos;

/// Markup token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // ── Compound tokens ──────────────────────────────────────────────

    /// `<!-- ... -->`
    #[regex(r"<!--([^-]|-[^-])*-->")]
    Comment,

    /// `<?xml version="1.0"?>` and other processing instructions.
    #[regex(r"<\?[^?]*\?>")]
    Declaration,

    /// `</`
    #[token("</")]
    EndTagOpen,

    /// `/>`
    #[token("/>")]
    EmptyTagClose,

    /// Double-quoted attribute value, quotes included.
    #[regex(r#""[^"<]*""#)]
    DoubleQuoted,

    /// Single-quoted attribute value, quotes included.
    #[regex(r"'[^'<]*'")]
    SingleQuoted,

    /// Element or attribute name.
    #[regex(r"[A-Za-z_][A-Za-z0-9_.:-]*")]
    Name,

    // ── Single-character punctuation ─────────────────────────────────

    /// `<`
    #[token("<")]
    TagOpen,

    /// `>`
    #[token(">")]
    TagClose,

    /// `=`
    #[token("=")]
    Equals,
}

/// Tokenize markup into `(Token, &str)` pairs, dropping anything that fails
/// to lex.
pub fn tokenize(input: &str) -> Vec<(Token, &str)> {
    Token::lexer(input)
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, &input[span])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_start_tag() {
        assert_eq!(
            tokenize(r#"<menu name="File">"#),
            vec![
                (Token::TagOpen, "<"),
                (Token::Name, "menu"),
                (Token::Name, "name"),
                (Token::Equals, "="),
                (Token::DoubleQuoted, "\"File\""),
                (Token::TagClose, ">"),
            ]
        );
    }

    #[test]
    fn test_empty_element() {
        assert_eq!(
            tokens("<separator/>"),
            vec![Token::TagOpen, Token::Name, Token::EmptyTagClose]
        );
    }

    #[test]
    fn test_end_tag() {
        assert_eq!(
            tokens("</menubar>"),
            vec![Token::EndTagOpen, Token::Name, Token::TagClose]
        );
    }

    #[test]
    fn test_single_quoted() {
        assert_eq!(
            tokenize("action='Quit'"),
            vec![
                (Token::Name, "action"),
                (Token::Equals, "="),
                (Token::SingleQuoted, "'Quit'"),
            ]
        );
    }

    #[test]
    fn test_hyphenated_attribute_name() {
        assert_eq!(tokenize("always-show-image")[0], (Token::Name, "always-show-image"));
    }

    #[test]
    fn test_comment_priority_over_tag_open() {
        assert_eq!(tokens("<!-- a - b -->"), vec![Token::Comment]);
        assert_eq!(tokens("<!---->"), vec![Token::Comment]);
    }

    #[test]
    fn test_declaration() {
        assert_eq!(
            tokens(r#"<?xml version="1.0"?><ui>"#),
            vec![Token::Declaration, Token::TagOpen, Token::Name, Token::TagClose]
        );
    }

    #[test]
    fn test_whitespace_is_skipped() {
        assert_eq!(
            tokens("  <ui>\n\t</ui>  "),
            vec![
                Token::TagOpen,
                Token::Name,
                Token::TagClose,
                Token::EndTagOpen,
                Token::Name,
                Token::TagClose,
            ]
        );
    }

    #[test]
    fn test_unlexable_characters_dropped() {
        assert_eq!(tokens("& !"), Vec::<Token>::new());
    }

    #[test]
    fn test_empty_input() {
        assert!(tokens("").is_empty());
    }
}
