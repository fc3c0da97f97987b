//! Pretty serializer for element trees.

use crate::node::{Element, Node};

/// Escape text content.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// Serialize a [`Node`].
///
/// - `tab`: indentation unit (e.g. `"  "`); use `""` for compact output.
/// - `indent`: current indentation prefix (used in recursion).
pub fn to_xml(node: &Node, tab: &str, indent: &str) -> String {
    match node {
        Node::Text(s) => format!("{}{}", indent, escape_text(s)),
        Node::Comment(s) => format!("{}<!--{}-->", indent, s),
        Node::Element(el) => element_to_xml(el, tab, indent),
    }
}

/// Serialize an [`Element`] and its subtree.
///
/// Elements holding only text render inline (`<name>foo</name>`), empty
/// elements self-close (`<disk/>`), and anything else puts one child per
/// line, indented by `tab`.
pub fn element_to_xml(el: &Element, tab: &str, indent: &str) -> String {
    let children_indent = format!("{}{}", indent, tab);
    let do_indent = !tab.is_empty();

    let text_only_children = el.children.iter().all(|c| matches!(c, Node::Text(_)));

    // Attributes in insertion order
    let mut head = format!("{}<{}", indent, el.name);
    for (k, v) in &el.attrs {
        head.push(' ');
        head.push_str(k);
        head.push_str("=\"");
        head.push_str(&escape_attr(v));
        head.push('"');
    }

    if el.children.is_empty() {
        head.push_str("/>");
        return head;
    }

    let mut out = head;
    out.push('>');
    if text_only_children {
        for child in &el.children {
            if let Node::Text(s) = child {
                out.push_str(&escape_text(s));
            }
        }
    } else {
        for child in &el.children {
            if do_indent {
                out.push('\n');
            }
            out.push_str(&to_xml(child, tab, &children_indent));
        }
        if do_indent {
            out.push('\n');
            out.push_str(indent);
        }
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
    out
}
