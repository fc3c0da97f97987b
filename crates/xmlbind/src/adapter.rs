//! The document seam.
//!
//! The engine never touches a tree directly. Everything it needs from the
//! backing document goes through [`DocumentAdapter`], addressed by absolute
//! [`XPath`]s. [`xmlbind_tree::Document`] is the implementation shipped with
//! the crate.

use std::fmt;

use xmlbind_path::XPath;
use xmlbind_tree::Document;

use crate::error::DocumentError;
use crate::value::Value;

/// Raw path-indexed operations on a backing document.
pub trait DocumentAdapter: fmt::Debug {
    /// Read the node at `path`. With `presence` set the result is
    /// `Value::Bool` telling whether the node exists, otherwise the node's
    /// text or `Value::Null` when absent.
    fn read(&self, path: &XPath, presence: bool) -> Result<Value, DocumentError>;

    /// Write a value:
    /// null or `false` removes the node, `true` ensures an empty node exists,
    /// anything else sets text content, creating missing nodes on the way.
    fn write(&mut self, path: &XPath, value: &Value) -> Result<(), DocumentError>;

    /// Number of nodes matching `path`.
    fn count(&self, path: &XPath) -> Result<usize, DocumentError>;

    /// Blank the node at `path` but keep it in place.
    fn clear_node(&mut self, path: &XPath) -> Result<(), DocumentError>;

    /// Remove the node at `path` and its subtree.
    fn remove_node(&mut self, path: &XPath) -> Result<(), DocumentError>;

    /// Splice a rendered fragment in so it becomes the node at `position`:
    /// right after the preceding same-named sibling, or as the last child of
    /// the container when there is none.
    fn insert_rendered(&mut self, fragment: &str, position: &XPath) -> Result<(), DocumentError>;

    /// Serialize the subtree at `path`. Empty when there is nothing there.
    fn render(&self, path: &XPath) -> Result<String, DocumentError>;

    /// An independent copy of the whole document.
    fn duplicate(&self) -> Box<dyn DocumentAdapter>;
}

/// Turns literal content into a document.
pub type DocumentFactory = fn(&str) -> Result<Box<dyn DocumentAdapter>, DocumentError>;

/// Default factory backed by [`xmlbind_tree::Document`].
pub fn tree_factory(content: &str) -> Result<Box<dyn DocumentAdapter>, DocumentError> {
    Ok(Box::new(Document::parse(content)?))
}

impl DocumentAdapter for Document {
    fn read(&self, path: &XPath, presence: bool) -> Result<Value, DocumentError> {
        if presence {
            return Ok(Value::Bool(self.exists(path)));
        }
        Ok(self.content(path).map_or(Value::Null, Value::Text))
    }

    fn write(&mut self, path: &XPath, value: &Value) -> Result<(), DocumentError> {
        match value {
            Value::Null | Value::Bool(false) => {
                self.remove_node(path);
            }
            Value::Bool(true) => self.make_stub(path)?,
            other => {
                let text = other.to_text().unwrap_or_default();
                self.set_content(path, &text)?;
            }
        }
        Ok(())
    }

    fn count(&self, path: &XPath) -> Result<usize, DocumentError> {
        Ok(Document::count(self, path))
    }

    fn clear_node(&mut self, path: &XPath) -> Result<(), DocumentError> {
        Document::clear_node(self, path);
        Ok(())
    }

    fn remove_node(&mut self, path: &XPath) -> Result<(), DocumentError> {
        Document::remove_node(self, path);
        Ok(())
    }

    fn insert_rendered(&mut self, fragment: &str, position: &XPath) -> Result<(), DocumentError> {
        Ok(self.insert_xml(position, fragment)?)
    }

    fn render(&self, path: &XPath) -> Result<String, DocumentError> {
        Ok(Document::render(self, path).unwrap_or_default())
    }

    fn duplicate(&self) -> Box<dyn DocumentAdapter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> XPath {
        s.parse().unwrap()
    }

    #[test]
    fn write_semantics() {
        let mut doc = tree_factory("<domain/>").unwrap();
        doc.write(&p("./features/acpi"), &Value::Bool(true)).unwrap();
        doc.write(&p("./vcpu"), &Value::Hex(8)).unwrap();
        doc.write(&p("./@type"), &Value::from("kvm")).unwrap();
        assert_eq!(doc.read(&p("./features/acpi"), true).unwrap(), Value::Bool(true));
        assert_eq!(doc.read(&p("./vcpu"), false).unwrap(), Value::from("0x8"));

        doc.write(&p("./features/acpi"), &Value::Bool(false)).unwrap();
        doc.write(&p("./@type"), &Value::Null).unwrap();
        assert_eq!(doc.read(&p("./features/acpi"), true).unwrap(), Value::Bool(false));
        assert_eq!(doc.read(&p("./@type"), false).unwrap(), Value::Null);
        assert_eq!(
            doc.render(&p(".")).unwrap(),
            "<domain>\n  <features/>\n  <vcpu>0x8</vcpu>\n</domain>"
        );
    }

    #[test]
    fn duplicate_is_detached() {
        let doc = tree_factory("<d><a/></d>").unwrap();
        let mut copy = doc.duplicate();
        copy.remove_node(&p("./a")).unwrap();
        assert_eq!(doc.count(&p("./a")).unwrap(), 1);
        assert_eq!(copy.count(&p("./a")).unwrap(), 0);
        assert_eq!(copy.render(&p("./a")).unwrap(), "");
    }

    #[test]
    fn insert_lands_after_previous_sibling() {
        let mut doc = tree_factory("<d><disk/><net/></d>").unwrap();
        doc.insert_rendered("<disk id='2'/>\n", &p("./disk[2]")).unwrap();
        assert_eq!(
            doc.render(&p(".")).unwrap(),
            "<d>\n  <disk/>\n  <disk id=\"2\"/>\n  <net/>\n</d>"
        );
    }

    #[test]
    fn malformed_content() {
        let err = tree_factory("<d>").unwrap_err();
        assert!(matches!(err, DocumentError::Malformed(_)));
    }
}
