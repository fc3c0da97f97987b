//! Text parser for element trees.
//!
//! Handles elements, attributes, text, comments, CDATA sections and the
//! predefined/numeric entities. The prolog, processing instructions and
//! doctype are skipped. Whitespace-only text is dropped so the serializer
//! owns indentation.

use thiserror::Error;

use crate::node::{Element, Node};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedTag { expected: String, found: String },
    #[error("document has no root element")]
    NoRoot,
    #[error("content after the root element at offset {0}")]
    TrailingContent(usize),
    #[error("unknown entity &{0};")]
    UnknownEntity(String),
    #[error("duplicate attribute {0:?}")]
    DuplicateAttribute(String),
}

/// Parse a complete document and return its root element.
pub fn parse_document(input: &str) -> Result<Element, ParseError> {
    let mut parser = Parser { input, pos: 0 };
    parser.skip_misc()?;
    if parser.is_at_end() {
        return Err(ParseError::NoRoot);
    }
    let root = parser.parse_element()?;
    parser.skip_misc()?;
    if !parser.is_at_end() {
        return Err(ParseError::TrailingContent(parser.pos));
    }
    Ok(root)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Skip whitespace, prolog, processing instructions, doctype and
    /// top-level comments.
    fn skip_misc(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<?") {
                self.skip_past("?>")?;
            } else if self.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if self.starts_with("<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_doctype(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            self.advance();
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(ParseError::UnexpectedEnd)
    }

    fn parse_element(&mut self) -> Result<Element, ParseError> {
        self.expect('<')?;
        let name = self.parse_name()?;
        let mut el = Element::new(name);

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('/') => {
                    self.advance();
                    self.expect('>')?;
                    return Ok(el);
                }
                Some('>') => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    let (key, value) = self.parse_attribute()?;
                    if el.attr(&key).is_some() {
                        return Err(ParseError::DuplicateAttribute(key));
                    }
                    el.attrs.push((key, value));
                }
                None => return Err(ParseError::UnexpectedEnd),
            }
        }

        loop {
            if self.is_at_end() {
                return Err(ParseError::UnexpectedEnd);
            }
            if self.starts_with("</") {
                self.pos += 2;
                let found = self.parse_name()?;
                self.skip_whitespace();
                self.expect('>')?;
                if found != el.name {
                    return Err(ParseError::MismatchedTag {
                        expected: el.name,
                        found,
                    });
                }
                return Ok(el);
            } else if self.starts_with("<!--") {
                self.pos += 4;
                let body = self.take_until("-->")?;
                el.push(Node::Comment(body.to_string()));
            } else if self.starts_with("<![CDATA[") {
                self.pos += 9;
                let body = self.take_until("]]>")?;
                el.push(Node::Text(body.to_string()));
            } else if self.starts_with("<?") {
                self.skip_past("?>")?;
            } else if self.peek() == Some('<') {
                let child = self.parse_element()?;
                el.push(Node::Element(child));
            } else {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c == '<' {
                        break;
                    }
                    self.advance();
                }
                let raw = &self.input[start..self.pos];
                if !raw.trim().is_empty() {
                    el.push(Node::Text(decode_entities(raw)?));
                }
            }
        }
    }

    fn parse_attribute(&mut self) -> Result<(String, String), ParseError> {
        let key = self.parse_name()?;
        self.skip_whitespace();
        self.expect('=')?;
        self.skip_whitespace();
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            Some(c) => return Err(ParseError::UnexpectedChar(c, self.pos)),
            None => return Err(ParseError::UnexpectedEnd),
        };
        self.advance();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                break;
            }
            self.advance();
        }
        let raw = &self.input[start..self.pos];
        self.expect(quote)?;
        Ok((key, decode_entities(raw)?))
    }

    fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' || c == ':' => self.advance(),
            Some(c) => return Err(ParseError::UnexpectedChar(c, self.pos)),
            None => return Err(ParseError::UnexpectedEnd),
        }
        while let Some(c) = self.peek() {
            if !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')) {
                break;
            }
            self.advance();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// Return the text up to `end` and move past `end`.
    fn take_until(&mut self, end: &str) -> Result<&'a str, ParseError> {
        let input: &'a str = self.input;
        let rest = &input[self.pos..];
        match rest.find(end) {
            Some(idx) => {
                let body = &rest[..idx];
                self.pos += idx + end.len();
                Ok(body)
            }
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn skip_past(&mut self, end: &str) -> Result<(), ParseError> {
        self.take_until(end).map(|_| ())
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(c) => Err(ParseError::UnexpectedChar(c, self.pos)),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}

/// Decode the predefined and numeric character entities.
fn decode_entities(raw: &str) -> Result<String, ParseError> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| ParseError::UnknownEntity(after.to_string()))?;
        let entity = &after[..semi];
        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => {
                let code = if let Some(hex) = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
            }
        };
        match decoded {
            Some(c) => out.push(c),
            None => return Err(ParseError::UnknownEntity(entity.to_string())),
        }
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
