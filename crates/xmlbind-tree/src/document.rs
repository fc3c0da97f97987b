//! Path-indexed access to an element tree.

use xmlbind_path::{Step, XPath};

use crate::node::{Element, Node};
use crate::parse::{parse_document, ParseError};
use crate::render::element_to_xml;
use crate::TreeError;

/// Indentation unit used by [`Document::render`].
const TAB: &str = "  ";

/// The node a path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Element(&'a Element),
    Attribute(&'a str),
}

/// A mutable document addressed by [`XPath`]s relative to its root element.
///
/// Element steps without an index select the first match; `name[n]` selects
/// the n-th matching sibling. Writes create any missing intermediate
/// elements, appending new siblings until an indexed step can be satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    root: Option<Element>,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root: Some(root) }
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parse_document(text).map(Self::new)
    }

    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Resolve a path to an element or attribute.
    pub fn get(&self, path: &XPath) -> Option<Target<'_>> {
        match path.steps().split_last() {
            Some((Step::Attribute(name), head)) => self
                .find_element(head)?
                .attr(name)
                .map(Target::Attribute),
            _ => self.find_element(path.steps()).map(Target::Element),
        }
    }

    pub fn exists(&self, path: &XPath) -> bool {
        self.get(path).is_some()
    }

    /// Text content of an element, or the value of an attribute.
    pub fn content(&self, path: &XPath) -> Option<String> {
        match self.get(path)? {
            Target::Element(el) => Some(el.text()),
            Target::Attribute(value) => Some(value.to_string()),
        }
    }

    /// Number of nodes matching `path`.
    ///
    /// An unindexed final element step counts every same-named sibling under
    /// the resolved parent; anything else counts 0 or 1.
    pub fn count(&self, path: &XPath) -> usize {
        match path.steps().split_last() {
            None => usize::from(self.root.is_some()),
            Some((Step::Element { name, index: None }, head)) => self
                .find_element(head)
                .map_or(0, |parent| parent.count_named(name)),
            Some(_) => usize::from(self.exists(path)),
        }
    }

    /// Set element text or attribute value, creating the node if needed.
    pub fn set_content(&mut self, path: &XPath, text: &str) -> Result<(), TreeError> {
        match path.steps().split_last() {
            Some((Step::Attribute(name), head)) => {
                self.ensure_element(head)?.set_attr(name, text);
            }
            _ => self.ensure_element(path.steps())?.set_text(text),
        }
        Ok(())
    }

    /// Make sure the node at `path` exists, leaving existing content alone.
    pub fn make_stub(&mut self, path: &XPath) -> Result<(), TreeError> {
        match path.steps().split_last() {
            Some((Step::Attribute(name), head)) => {
                let el = self.ensure_element(head)?;
                if el.attr(name).is_none() {
                    el.set_attr(name, "");
                }
            }
            _ => {
                self.ensure_element(path.steps())?;
            }
        }
        Ok(())
    }

    /// Blank a node's content in place. Returns false if nothing matched.
    pub fn clear_node(&mut self, path: &XPath) -> bool {
        match path.steps().split_last() {
            Some((Step::Attribute(name), head)) => {
                match self.find_element_mut(head) {
                    Some(el) if el.attr(name).is_some() => {
                        el.set_attr(name, "");
                        true
                    }
                    _ => false,
                }
            }
            _ => self.find_element_mut(path.steps()).map(Element::clear).is_some(),
        }
    }

    /// Delete a node and its subtree. Returns false if nothing matched.
    pub fn remove_node(&mut self, path: &XPath) -> bool {
        match path.steps().split_last() {
            None => self.root.take().is_some(),
            Some((Step::Attribute(name), head)) => self
                .find_element_mut(head)
                .is_some_and(|el| el.remove_attr(name)),
            Some((Step::Element { name, index }, head)) => {
                let Some(parent) = self.find_element_mut(head) else {
                    return false;
                };
                match parent.position_of(name, index.unwrap_or(1) - 1) {
                    Some(pos) => {
                        parent.children.remove(pos);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Parse `fragment` and append it as the last child of the element at
    /// `parent`, creating `parent` if needed.
    pub fn append_xml(&mut self, parent: &XPath, fragment: &str) -> Result<(), TreeError> {
        let el = parse_document(fragment)?;
        if parent.is_root() && self.root.is_none() {
            self.root = Some(el);
            return Ok(());
        }
        self.ensure_element(parent.steps())?.push(Node::Element(el));
        Ok(())
    }

    /// Parse `fragment` and splice it in so it becomes the node at `at`.
    ///
    /// For `name[n]` the fragment goes right after `name[n-1]`; without a
    /// preceding sibling it is appended to the parent element.
    pub fn insert_xml(&mut self, at: &XPath, fragment: &str) -> Result<(), TreeError> {
        let (name, index, head) = match at.steps().split_last() {
            None => return self.append_xml(at, fragment),
            Some((Step::Element { name, index }, head)) => (name, index.unwrap_or(1), head),
            Some((Step::Attribute(_), _)) => return Err(TreeError::Unresolvable(at.to_string())),
        };
        let el = parse_document(fragment)?;
        let parent = self.ensure_element(head)?;
        let after = index
            .checked_sub(2)
            .and_then(|prev| parent.position_of(name, prev));
        match after {
            Some(pos) => parent.children.insert(pos + 1, Node::Element(el)),
            None => parent.push(Node::Element(el)),
        }
        Ok(())
    }

    /// Serialize the subtree at `path`, indented from column zero.
    pub fn render(&self, path: &XPath) -> Option<String> {
        match self.get(path)? {
            Target::Element(el) => Some(element_to_xml(el, TAB, "")),
            Target::Attribute(value) => Some(value.to_string()),
        }
    }

    /// Serialize the whole document. Empty if the root was removed.
    pub fn to_xml(&self) -> String {
        self.render(&XPath::root()).unwrap_or_default()
    }

    fn find_element(&self, steps: &[Step]) -> Option<&Element> {
        let mut cur = self.root.as_ref()?;
        for step in steps {
            match step {
                Step::Element { name, index } => {
                    cur = cur.nth_named(name, index.unwrap_or(1) - 1)?;
                }
                Step::Attribute(_) => return None,
            }
        }
        Some(cur)
    }

    fn find_element_mut(&mut self, steps: &[Step]) -> Option<&mut Element> {
        let mut cur = self.root.as_mut()?;
        for step in steps {
            match step {
                Step::Element { name, index } => {
                    cur = cur.nth_named_mut(name, index.unwrap_or(1) - 1)?;
                }
                Step::Attribute(_) => return None,
            }
        }
        Some(cur)
    }

    fn ensure_element(&mut self, steps: &[Step]) -> Result<&mut Element, TreeError> {
        let unresolvable = || TreeError::Unresolvable(XPath::from_steps(steps.to_vec()).to_string());
        let mut cur = self.root.as_mut().ok_or(TreeError::NoRoot)?;
        for step in steps {
            let (name, nth) = match step {
                Step::Element { name, index } => (name, index.unwrap_or(1)),
                Step::Attribute(_) => return Err(unresolvable()),
            };
            for _ in cur.count_named(name)..nth {
                cur.children.push(Node::Element(Element::new(name.clone())));
            }
            cur = cur.nth_named_mut(name, nth - 1).ok_or_else(unresolvable)?;
        }
        Ok(cur)
    }
}
