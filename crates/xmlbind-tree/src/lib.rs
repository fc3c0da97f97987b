//! xmlbind-tree: an in-memory element tree addressed by path expressions.
//!
//! The tree keeps element order, attribute order and comments from the text
//! it was parsed from, and serializes with two-space indentation. All reads
//! and writes go through [`xmlbind_path::XPath`]s relative to the root
//! element.
//!
//! ```
//! use xmlbind_tree::Document;
//!
//! let mut doc = Document::parse("<domain type='kvm'><name>vm1</name></domain>").unwrap();
//! let name = "./name".parse().unwrap();
//! assert_eq!(doc.content(&name), Some("vm1".to_string()));
//!
//! doc.set_content(&"./devices/disk/@type".parse().unwrap(), "file").unwrap();
//! assert_eq!(
//!     doc.to_xml(),
//!     "<domain type=\"kvm\">\n  <name>vm1</name>\n  <devices>\n    <disk type=\"file\"/>\n  </devices>\n</domain>"
//! );
//! ```

use thiserror::Error;

pub mod node;
pub use node::{Element, Node};

pub mod parse;
pub use parse::{parse_document, ParseError};

pub mod render;
pub use render::{element_to_xml, to_xml};

pub mod document;
pub use document::{Document, Target};

/// Errors produced by path-indexed writes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("document has no root element")]
    NoRoot,
    #[error("cannot create a node at {0}")]
    Unresolvable(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
