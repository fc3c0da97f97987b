//! Type definitions for path expressions.

use std::fmt;
use std::str::FromStr;

use crate::PathError;

/// A step in a path expression.
///
/// Either a child element (optionally narrowed to the n-th match) or an
/// attribute of the current element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// Child element by name. `index` is 1-based, as written in `disk[2]`.
    Element { name: String, index: Option<usize> },
    /// Attribute of the context element: `@name`.
    Attribute(String),
}

impl Step {
    /// Child element step without an index.
    pub fn element(name: impl Into<String>) -> Self {
        Step::Element {
            name: name.into(),
            index: None,
        }
    }

    /// Child element step selecting the `index`-th (1-based) match.
    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        Step::Element {
            name: name.into(),
            index: Some(index),
        }
    }

    /// Attribute step.
    pub fn attribute(name: impl Into<String>) -> Self {
        Step::Attribute(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Step::Element { name, .. } => name,
            Step::Attribute(name) => name,
        }
    }

    /// The 1-based index written on this step, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Step::Element { index, .. } => *index,
            Step::Attribute(_) => None,
        }
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self, Step::Attribute(_))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Element {
                name,
                index: Some(idx),
            } => write!(f, "{name}[{idx}]"),
            Step::Element { name, index: None } => f.write_str(name),
            Step::Attribute(name) => write!(f, "@{name}"),
        }
    }
}

/// A path expression, relative to some context element.
///
/// The empty path (`.`) addresses the context element itself. Paths format
/// as `./devices/disk[2]/@type` and parse from the same syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct XPath {
    steps: Vec<Step>,
}

impl XPath {
    /// The context element itself (`.`).
    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Parse a path expression. See [`crate::parse_xpath`].
    pub fn parse(input: &str) -> Result<Self, PathError> {
        crate::parse_xpath(input)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_root(&self) -> bool {
        crate::is_root(self)
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// True if the final step selects an attribute.
    pub fn targets_attribute(&self) -> bool {
        self.last().is_some_and(Step::is_attribute)
    }

    /// Append the steps of `rel` to this path.
    pub fn join(&self, rel: &XPath) -> XPath {
        crate::join(self, rel)
    }

    /// Append a single unindexed element step.
    pub fn child(&self, name: &str) -> XPath {
        let mut out = self.clone();
        out.steps.push(Step::element(name));
        out
    }

    /// Set the 1-based index on the final element step.
    ///
    /// Paths ending in an attribute (or the root path) are returned as-is.
    pub fn with_index(mut self, index: usize) -> XPath {
        if let Some(Step::Element { index: slot, .. }) = self.steps.last_mut() {
            *slot = Some(index);
        }
        self
    }

    pub(crate) fn push(&mut self, step: Step) {
        self.steps.push(step);
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(".")?;
        for step in &self.steps {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

impl FromStr for XPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse_xpath(s)
    }
}
