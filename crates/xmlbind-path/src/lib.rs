//! Path expressions for addressing nodes in a document tree.
//!
//! A path is a sequence of steps relative to a context element. Element steps
//! may carry a 1-based sibling index, and a path may end in an attribute:
//!
//! ```text
//! .                          the context element
//! ./name                     first <name> child
//! ./devices/disk[2]          second <disk> under <devices>
//! ./devices/disk[2]/@type    its "type" attribute
//! ```
//!
//! # Example
//!
//! ```
//! use xmlbind_path::{parse_xpath, join, sibling_index};
//!
//! let disk = parse_xpath("./devices/disk[3]").unwrap();
//! let field = parse_xpath("./driver/@name").unwrap();
//!
//! let abs = join(&disk, &field);
//! assert_eq!(abs.to_string(), "./devices/disk[3]/driver/@name");
//! assert_eq!(sibling_index(&disk), 2);
//! ```

use thiserror::Error;

pub mod types;
pub use types::{Step, XPath};

pub mod util;
pub use util::{
    depth, is_child, is_indexed, is_name, is_root, is_valid_index, join, parent, sibling_index,
};

pub mod validate;
pub use validate::{validate_expression, validate_path, ValidationError};

use util::is_name_char;

/// Errors produced while parsing or manipulating paths.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path expression")]
    Empty,
    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected end of path expression")]
    UnexpectedEnd,
    #[error("invalid sibling index {0:?}")]
    InvalidIndex(String),
    #[error("root path has no parent")]
    NoParent,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Parse a path expression.
///
/// Accepts a leading `./` or a bare relative form, so `./a/b` and `a/b` are
/// the same path. `.` alone is the root path.
///
/// # Example
///
/// ```
/// use xmlbind_path::{parse_xpath, Step};
///
/// let p = parse_xpath("./devices/disk[2]/@type").unwrap();
/// assert_eq!(
///     p.steps(),
///     &[
///         Step::element("devices"),
///         Step::indexed("disk", 2),
///         Step::attribute("type"),
///     ]
/// );
/// assert!(parse_xpath(".").unwrap().is_root());
/// assert!(parse_xpath("./disk[0]").is_err());
/// ```
pub fn parse_xpath(input: &str) -> Result<XPath, PathError> {
    validate_expression(input)?;
    let path = Parser { input, pos: 0 }.parse_path()?;
    validate_path(&path)?;
    Ok(path)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_path(&mut self) -> Result<XPath, PathError> {
        if self.input.is_empty() {
            return Err(PathError::Empty);
        }

        let mut path = XPath::root();
        loop {
            if let Some(step) = self.parse_step()? {
                path.push(step);
            }
            if self.is_at_end() {
                break;
            }
            self.expect('/')?;
            if self.is_at_end() {
                // trailing slash
                return Err(PathError::UnexpectedEnd);
            }
        }
        Ok(path)
    }

    /// Parse one step. Returns `None` for a `.` self step.
    fn parse_step(&mut self) -> Result<Option<Step>, PathError> {
        match self.peek() {
            Some('@') => {
                self.advance();
                let name = self.parse_name()?;
                Ok(Some(Step::Attribute(name)))
            }
            Some('.') if matches!(self.peek_at(1), None | Some('/')) => {
                self.advance();
                Ok(None)
            }
            Some(_) => {
                let name = self.parse_name()?;
                let index = if self.peek() == Some('[') {
                    Some(self.parse_index()?)
                } else {
                    None
                };
                Ok(Some(Step::Element { name, index }))
            }
            None => Err(PathError::UnexpectedEnd),
        }
    }

    fn parse_name(&mut self) -> Result<String, PathError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.advance(),
            Some(c) => return Err(PathError::UnexpectedChar(c, self.pos)),
            None => return Err(PathError::UnexpectedEnd),
        }
        while let Some(c) = self.peek() {
            if !is_name_char(c) {
                break;
            }
            self.advance();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_index(&mut self) -> Result<usize, PathError> {
        self.expect('[')?;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == ']' {
                break;
            }
            self.advance();
        }
        let text = &self.input[start..self.pos];
        self.expect(']')?;
        if !is_valid_index(text) {
            return Err(PathError::InvalidIndex(text.to_string()));
        }
        text.parse()
            .map_err(|_| PathError::InvalidIndex(text.to_string()))
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), PathError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(c) => Err(PathError::UnexpectedChar(c, self.pos)),
            None => Err(PathError::UnexpectedEnd),
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}
