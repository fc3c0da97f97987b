//! Element tree node types.

/// A node in the element tree: an element, a text leaf, or a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Text content leaf (already entity-decoded)
    Text(String),
    /// Comment body, without the `<!--`/`-->` delimiters
    Comment(String),
}

/// An element: name, attributes, and children.
///
/// Attributes use an ordered `Vec<(key, value)>` so the document keeps the
/// attribute order it was parsed with and new attributes land at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|(k, _)| k != name);
        self.attrs.len() != before
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn count_named(&self, name: &str) -> usize {
        self.elements().filter(|el| el.name == name).count()
    }

    /// The `nth` (0-based) child element called `name`.
    pub fn nth_named(&self, name: &str, nth: usize) -> Option<&Element> {
        self.elements().filter(|el| el.name == name).nth(nth)
    }

    pub fn nth_named_mut(&mut self, name: &str, nth: usize) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .filter_map(|c| match c {
                Node::Element(el) if el.name == name => Some(el),
                _ => None,
            })
            .nth(nth)
    }

    /// Position in `children` of the `nth` (0-based) child element called `name`.
    pub fn position_of(&self, name: &str, nth: usize) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Node::Element(el) if el.name == name))
            .map(|(pos, _)| pos)
            .nth(nth)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children.clear();
        if !text.is_empty() {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    /// Drop every attribute and child, keeping the element itself.
    pub fn clear(&mut self) {
        self.attrs.clear();
        self.children.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.children.is_empty()
    }

    /// Append a child node, merging adjacent text.
    pub fn push(&mut self, node: Node) {
        if let Node::Text(more) = &node {
            if let Some(Node::Text(prev)) = self.children.last_mut() {
                prev.push_str(more);
                return;
            }
        }
        self.children.push(node);
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(s) => out.push_str(s),
            Node::Element(inner) => collect_text(inner, out),
            Node::Comment(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(kind: &str) -> Node {
        let mut el = Element::new("disk");
        el.set_attr("type", kind);
        Node::Element(el)
    }

    #[test]
    fn attrs_keep_position_on_update() {
        let mut el = Element::new("disk");
        el.set_attr("type", "file");
        el.set_attr("device", "disk");
        el.set_attr("type", "block");
        assert_eq!(
            el.attrs,
            vec![
                ("type".to_string(), "block".to_string()),
                ("device".to_string(), "disk".to_string())
            ]
        );
        assert!(el.remove_attr("type"));
        assert!(!el.remove_attr("type"));
    }

    #[test]
    fn nth_named_skips_other_nodes() {
        let mut devices = Element::new("devices");
        devices.push(disk("file"));
        devices.push(Node::Comment("x".into()));
        devices.push(Node::Element(Element::new("interface")));
        devices.push(disk("block"));

        assert_eq!(devices.count_named("disk"), 2);
        assert_eq!(devices.nth_named("disk", 1).and_then(|d| d.attr("type")), Some("block"));
        assert_eq!(devices.position_of("disk", 1), Some(3));
        assert!(devices.nth_named("disk", 2).is_none());
    }

    #[test]
    fn text_concatenates_descendants() {
        let mut el = Element::new("a");
        el.push(Node::Text("x".into()));
        el.push(Node::Text("y".into()));
        let mut b = Element::new("b");
        b.set_text("z");
        el.push(Node::Element(b));
        assert_eq!(el.children.len(), 2);
        assert_eq!(el.text(), "xyz");
    }

    #[test]
    fn clear_keeps_element() {
        let mut el = Element::new("disk");
        el.set_attr("type", "file");
        el.set_text("x");
        el.clear();
        assert!(el.is_empty());
        assert_eq!(el.name, "disk");
    }
}
