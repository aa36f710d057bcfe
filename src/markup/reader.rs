//! Markup reader: turns fragment text into start/end element events.
//!
//! Checks well-formedness (balanced, matching tags, quoted attribute values,
//! no character data) and decodes attribute values. Uses the logos-based
//! tokenizer from [`crate::markup::tokenizer`].

use std::fmt;

use logos::Logos;

use super::tokenizer::Token;
use super::unescape;

/// Errors from reading fragment markup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("unexpected character data on line {line} char {column}")]
    UnexpectedText { line: usize, column: usize },
    #[error("unexpected token on line {line} char {column}: {message}")]
    UnexpectedToken {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
    #[error("end tag '{found}' on line {line} char {column} does not match open element '{expected}'")]
    MismatchedEndTag {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
    #[error("end tag '{found}' on line {line} char {column} closes no open element")]
    UnmatchedEndTag {
        found: String,
        line: usize,
        column: usize,
    },
    #[error("unexpected start tag '{element}' on line {line} char {column}")]
    UnexpectedElement {
        element: String,
        line: usize,
        column: usize,
    },
    #[error("unknown attribute '{attribute}' on line {line} char {column}")]
    UnknownAttribute {
        attribute: String,
        line: usize,
        column: usize,
    },
    #[error("duplicate attribute '{attribute}' on line {line} char {column}")]
    DuplicateAttribute {
        attribute: String,
        line: usize,
        column: usize,
    },
    #[error("invalid entity '{entity}' on line {line} char {column}")]
    InvalidEntity {
        entity: String,
        line: usize,
        column: usize,
    },
}

/// 1-based line and character column in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} char {}", self.line, self.column)
    }
}

/// One decoded `name="value"` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub position: Position,
}

/// A start tag with its attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub position: Position,
}

impl Element {
    /// Value of the attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

/// Structural event. Empty elements produce a `Start` followed by an `End`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent {
    Start(Element),
    End { name: String, position: Position },
}

/// Read `input` into a flat event list.
///
/// Several top-level elements are accepted; the fragment parser decides
/// whether they need a synthesized root.
pub fn parse_markup(input: &str) -> Result<Vec<MarkupEvent>, MarkupError> {
    let lines = LineIndex::new(input);
    let tokens = tokenize_with_spans(input, &lines)?;
    let mut reader = Reader {
        tokens,
        cursor: 0,
        open: Vec::new(),
        events: Vec::new(),
    };
    reader.run()?;
    Ok(reader.events)
}

/// Byte offsets of line starts, for offset → line/column mapping.
struct LineIndex<'a> {
    source: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, starts }
    }

    fn position(&self, offset: usize) -> Position {
        let line = match self.starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        let start = self.starts[line];
        let column = self.source[start..offset].chars().count() + 1;
        Position {
            line: line + 1,
            column,
        }
    }
}

/// A positioned token.
#[derive(Debug, Clone)]
struct PToken<'a> {
    token: Token,
    text: &'a str,
    position: Position,
}

/// Tokenize with positions, failing on the first unlexable character.
fn tokenize_with_spans<'a>(
    input: &'a str,
    lines: &LineIndex<'_>,
) -> Result<Vec<PToken<'a>>, MarkupError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(input).spanned() {
        let position = lines.position(span.start);
        match result {
            Ok(token) => tokens.push(PToken {
                token,
                text: &input[span],
                position,
            }),
            Err(()) => {
                return Err(MarkupError::UnexpectedText {
                    line: position.line,
                    column: position.column,
                })
            }
        }
    }
    Ok(tokens)
}

/// Cursor-based reader state.
struct Reader<'a> {
    tokens: Vec<PToken<'a>>,
    cursor: usize,
    open: Vec<String>,
    events: Vec<MarkupEvent>,
}

impl<'a> Reader<'a> {
    fn advance(&mut self) -> Option<PToken<'a>> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<PToken<'a>, MarkupError> {
        match self.advance() {
            Some(tok) if tok.token == expected => Ok(tok),
            Some(tok) => Err(MarkupError::UnexpectedToken {
                line: tok.position.line,
                column: tok.position.column,
                message: format!("expected {what}, got '{}'", tok.text),
            }),
            None => Err(MarkupError::UnexpectedEof(format!("expected {what}"))),
        }
    }

    fn run(&mut self) -> Result<(), MarkupError> {
        while let Some(tok) = self.advance() {
            match tok.token {
                Token::Comment | Token::Declaration => {}
                Token::TagOpen => self.start_tag()?,
                Token::EndTagOpen => self.end_tag()?,
                _ => {
                    return Err(MarkupError::UnexpectedText {
                        line: tok.position.line,
                        column: tok.position.column,
                    })
                }
            }
        }
        match self.open.last() {
            Some(name) => Err(MarkupError::UnexpectedEof(format!(
                "element '{name}' was not closed"
            ))),
            None => Ok(()),
        }
    }

    /// Parse the rest of a start tag after `<`.
    fn start_tag(&mut self) -> Result<(), MarkupError> {
        let name_tok = self.expect(Token::Name, "element name")?;
        let mut element = Element {
            name: name_tok.text.to_owned(),
            attributes: Vec::new(),
            position: name_tok.position,
        };

        loop {
            let Some(tok) = self.advance() else {
                return Err(MarkupError::UnexpectedEof(format!(
                    "start tag '{}' was not finished",
                    element.name
                )));
            };
            match tok.token {
                Token::Name => {
                    let attribute = self.attribute(tok)?;
                    if element.attribute(&attribute.name).is_some() {
                        return Err(MarkupError::DuplicateAttribute {
                            attribute: attribute.name,
                            line: attribute.position.line,
                            column: attribute.position.column,
                        });
                    }
                    element.attributes.push(attribute);
                }
                Token::TagClose => {
                    self.open.push(element.name.clone());
                    self.events.push(MarkupEvent::Start(element));
                    return Ok(());
                }
                Token::EmptyTagClose => {
                    let end = MarkupEvent::End {
                        name: element.name.clone(),
                        position: tok.position,
                    };
                    self.events.push(MarkupEvent::Start(element));
                    self.events.push(end);
                    return Ok(());
                }
                _ => {
                    return Err(MarkupError::UnexpectedToken {
                        line: tok.position.line,
                        column: tok.position.column,
                        message: format!("expected attribute or '>', got '{}'", tok.text),
                    })
                }
            }
        }
    }

    /// Parse `= "value"` after an attribute name.
    fn attribute(&mut self, name: PToken<'a>) -> Result<Attribute, MarkupError> {
        self.expect(Token::Equals, "'='")?;
        let value = match self.advance() {
            Some(tok) if matches!(tok.token, Token::DoubleQuoted | Token::SingleQuoted) => tok,
            Some(tok) => {
                return Err(MarkupError::UnexpectedToken {
                    line: tok.position.line,
                    column: tok.position.column,
                    message: format!("expected quoted value, got '{}'", tok.text),
                })
            }
            None => return Err(MarkupError::UnexpectedEof("expected quoted value".into())),
        };
        let raw = &value.text[1..value.text.len() - 1];
        let decoded = unescape(raw).map_err(|entity| MarkupError::InvalidEntity {
            entity,
            line: value.position.line,
            column: value.position.column,
        })?;
        Ok(Attribute {
            name: name.text.to_owned(),
            value: decoded.into_owned(),
            position: name.position,
        })
    }

    /// Parse the rest of an end tag after `</`.
    fn end_tag(&mut self) -> Result<(), MarkupError> {
        let name_tok = self.expect(Token::Name, "element name")?;
        self.expect(Token::TagClose, "'>'")?;
        let found = name_tok.text.to_owned();
        match self.open.pop() {
            Some(expected) if expected == found => {
                self.events.push(MarkupEvent::End {
                    name: found,
                    position: name_tok.position,
                });
                Ok(())
            }
            Some(expected) => Err(MarkupError::MismatchedEndTag {
                expected,
                found,
                line: name_tok.position.line,
                column: name_tok.position.column,
            }),
            None => Err(MarkupError::UnmatchedEndTag {
                found,
                line: name_tok.position.line,
                column: name_tok.position.column,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_names(events: &[MarkupEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                MarkupEvent::Start(el) => Some(el.name.as_str()),
                MarkupEvent::End { .. } => None,
            })
            .collect()
    }

    #[test]
    fn nested_elements() {
        let events = parse_markup(
            r#"<ui><menubar><menu action="File"><menuitem action="New"/></menu></menubar></ui>"#,
        )
        .unwrap();
        assert_eq!(start_names(&events), vec!["ui", "menubar", "menu", "menuitem"]);
        assert_eq!(events.len(), 8);
        assert!(matches!(&events[4], MarkupEvent::End { name, .. } if name == "menuitem"));
    }

    #[test]
    fn attributes_in_order() {
        let events =
            parse_markup(r#"<menu name='File' action="FileMenu" position="top"/>"#).unwrap();
        let MarkupEvent::Start(el) = &events[0] else {
            panic!("expected start event");
        };
        let names: Vec<_> = el.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["name", "action", "position"]);
        assert_eq!(el.attribute("action"), Some("FileMenu"));
        assert_eq!(el.attribute("missing"), None);
    }

    #[test]
    fn entities_are_decoded() {
        let events = parse_markup(r#"<menuitem name="a&amp;b &#65;&#x42;"/>"#).unwrap();
        let MarkupEvent::Start(el) = &events[0] else {
            panic!("expected start event");
        };
        assert_eq!(el.attribute("name"), Some("a&b AB"));
    }

    #[test]
    fn positions_are_one_based() {
        let events = parse_markup("<ui>\n  <menubar/>\n</ui>").unwrap();
        let MarkupEvent::Start(el) = &events[1] else {
            panic!("expected start event");
        };
        assert_eq!(el.position, Position { line: 2, column: 4 });
    }

    #[test]
    fn comments_and_declarations_ignored() {
        let events = parse_markup("<?xml version=\"1.0\"?>\n<!-- menus -->\n<ui/>").unwrap();
        assert_eq!(start_names(&events), vec!["ui"]);
    }

    #[test]
    fn multiple_top_level_elements() {
        let events = parse_markup("<menubar/><toolbar/>").unwrap();
        assert_eq!(start_names(&events), vec!["menubar", "toolbar"]);
    }

    #[test]
    fn character_data_rejected() {
        let err = parse_markup("<ui>\n  hello\n</ui>").unwrap_err();
        assert_eq!(err, MarkupError::UnexpectedText { line: 2, column: 3 });
    }

    #[test]
    fn stray_symbol_rejected() {
        let err = parse_markup("<ui> & </ui>").unwrap_err();
        assert_eq!(err, MarkupError::UnexpectedText { line: 1, column: 6 });
    }

    #[test]
    fn mismatched_end_tag() {
        let err = parse_markup("<ui><menubar></ui>").unwrap_err();
        assert!(matches!(
            err,
            MarkupError::MismatchedEndTag { ref expected, ref found, .. }
                if expected == "menubar" && found == "ui"
        ));
    }

    #[test]
    fn unmatched_end_tag() {
        let err = parse_markup("</ui>").unwrap_err();
        assert!(matches!(err, MarkupError::UnmatchedEndTag { .. }));
    }

    #[test]
    fn unclosed_element() {
        let err = parse_markup("<ui><menubar>").unwrap_err();
        assert!(matches!(err, MarkupError::UnexpectedEof(ref msg) if msg.contains("menubar")));
    }

    #[test]
    fn unquoted_value_rejected() {
        let err = parse_markup("<menu name=File/>").unwrap_err();
        assert!(matches!(err, MarkupError::UnexpectedToken { line: 1, column: 12, .. }));
    }

    #[test]
    fn duplicate_attribute_rejected() {
        let err = parse_markup(r#"<menu name="a" name="b"/>"#).unwrap_err();
        assert!(matches!(
            err,
            MarkupError::DuplicateAttribute { ref attribute, .. } if attribute == "name"
        ));
    }

    #[test]
    fn bad_entity_rejected() {
        let err = parse_markup(r#"<menu name="&bogus;"/>"#).unwrap_err();
        assert!(matches!(
            err,
            MarkupError::InvalidEntity { ref entity, .. } if entity == "&bogus;"
        ));
    }

    #[test]
    fn error_display_mentions_position() {
        let err = parse_markup("<ui>\n<ui>\n</menubar>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "end tag 'menubar' on line 3 char 3 does not match open element 'ui'"
        );
    }
}
