use crate::types::{Step, XPath};
use crate::PathError;

/// Check if a path addresses the context element itself.
pub fn is_root(path: &XPath) -> bool {
    path.is_empty()
}

/// Append `rel` to `base`.
///
/// `join(".", "./a")` is `./a` and `join("./a", ".")` is `./a`, so an
/// instance sitting at the root composes with its fields without special
/// casing.
pub fn join(base: &XPath, rel: &XPath) -> XPath {
    let mut steps = Vec::with_capacity(base.len() + rel.len());
    steps.extend_from_slice(base.steps());
    steps.extend_from_slice(rel.steps());
    XPath::from_steps(steps)
}

/// Get the parent path of a given path.
pub fn parent(path: &XPath) -> Result<XPath, PathError> {
    match path.steps().split_last() {
        Some((_, head)) => Ok(XPath::from_steps(head.to_vec())),
        None => Err(PathError::NoParent),
    }
}

/// True if the final step carries an explicit sibling index (`disk[3]`).
pub fn is_indexed(path: &XPath) -> bool {
    matches!(path.last(), Some(Step::Element { index: Some(_), .. }))
}

/// Zero-based sibling rank of the node addressed by `path`.
///
/// `./devices/disk[5]` is rank 4. A final step with no index is rank 0.
pub fn sibling_index(path: &XPath) -> usize {
    path.last()
        .and_then(Step::index)
        .map(|idx| idx.saturating_sub(1))
        .unwrap_or(0)
}

/// Number of element levels below the context element.
pub fn depth(path: &XPath) -> usize {
    path.steps().iter().filter(|s| !s.is_attribute()).count()
}

/// Check if `parent` path is a strict prefix of the `child` path.
pub fn is_child(parent: &XPath, child: &XPath) -> bool {
    if parent.len() >= child.len() {
        return false;
    }
    parent
        .steps()
        .iter()
        .zip(child.steps())
        .all(|(a, b)| a == b)
}

/// Check if a string is a valid 1-based sibling index.
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Check if a string is usable as an element or attribute name.
///
/// Accepts an optional `prefix:` namespace qualifier.
pub fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(is_name_char)
}

pub(crate) fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}
