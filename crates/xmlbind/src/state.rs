//! Per-instance document bookkeeping.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use xmlbind_path::{join, XPath};

use crate::adapter::DocumentAdapter;
use crate::error::{DocumentError, Error, Result};
use crate::registry::Registry;

pub type SharedDocument = Rc<RefCell<Box<dyn DocumentAdapter>>>;

/// A document an instance either created itself or shares with the
/// instance it is attached to.
#[derive(Debug, Clone)]
pub enum DocHandle {
    Owned(SharedDocument),
    Borrowed(SharedDocument),
}

impl DocHandle {
    fn shared(&self) -> &SharedDocument {
        match self {
            DocHandle::Owned(doc) | DocHandle::Borrowed(doc) => doc,
        }
    }
}

/// Where an instance sits in its document and how it got there.
#[derive(Debug)]
pub struct InstanceState {
    root_name: &'static str,
    namespace: Option<(String, String)>,
    parent: XPath,
    relative: XPath,
    is_build: bool,
    doc: DocHandle,
}

impl InstanceState {
    /// State of a standalone instance. Without content the instance is in
    /// build mode over a fresh `<ROOT_NAME/>` stub.
    pub(crate) fn standalone(
        registry: &Registry,
        root_name: &'static str,
        content: Option<&str>,
    ) -> Result<Self> {
        let namespace = registry.config().namespace_for(root_name)?;
        let is_build = content.map_or(true, str::is_empty);
        let doc = parse(registry, root_name, namespace.as_ref(), content)?;
        Ok(Self {
            root_name,
            namespace,
            parent: XPath::root(),
            relative: XPath::root(),
            is_build,
            doc: DocHandle::Owned(doc),
        })
    }

    /// State of a child created while its parent is being set up. It shares
    /// the parent's document and mode.
    pub(crate) fn nested(
        registry: &Registry,
        parent: &InstanceState,
        root_name: &'static str,
        relative: XPath,
    ) -> Result<Self> {
        Ok(Self {
            root_name,
            namespace: registry.config().namespace_for(root_name)?,
            parent: parent.abs_xpath(),
            relative,
            is_build: parent.is_build,
            doc: DocHandle::Borrowed(parent.doc.shared().clone()),
        })
    }

    pub fn root_name(&self) -> &'static str {
        self.root_name
    }

    pub fn is_build(&self) -> bool {
        self.is_build
    }

    pub fn owns_document(&self) -> bool {
        matches!(self.doc, DocHandle::Owned(_))
    }

    pub fn parent_xpath(&self) -> &XPath {
        &self.parent
    }

    pub fn relative_xpath(&self) -> &XPath {
        &self.relative
    }

    /// The instance's position in the whole document.
    pub fn abs_xpath(&self) -> XPath {
        join(&self.parent, &self.relative)
    }

    /// Resolve a field path against the instance's position.
    pub fn make_abs(&self, rel: &XPath) -> XPath {
        join(&self.abs_xpath(), rel)
    }

    pub(crate) fn set_parent_xpath(&mut self, parent: XPath) {
        self.parent = parent;
    }

    pub(crate) fn set_relative_xpath(&mut self, relative: XPath) {
        self.relative = relative;
    }

    /// Take a private document parsed from `content`.
    pub(crate) fn reparse(&mut self, registry: &Registry, content: Option<&str>) -> Result<()> {
        let doc = parse(registry, self.root_name, self.namespace.as_ref(), content)?;
        self.doc = DocHandle::Owned(doc);
        Ok(())
    }

    /// Share `parent`'s document. Build mode is inherited from the parent.
    pub(crate) fn borrow_from(&mut self, parent: &InstanceState) {
        self.is_build = parent.is_build || self.is_build;
        self.doc = DocHandle::Borrowed(parent.doc.shared().clone());
    }

    pub(crate) fn document(&self) -> Result<Ref<'_, Box<dyn DocumentAdapter>>, DocumentError> {
        self.doc.shared().try_borrow().map_err(|_| DocumentError::Busy)
    }

    pub(crate) fn document_mut(
        &self,
    ) -> Result<RefMut<'_, Box<dyn DocumentAdapter>>, DocumentError> {
        self.doc.shared().try_borrow_mut().map_err(|_| DocumentError::Busy)
    }
}

fn parse(
    registry: &Registry,
    root_name: &str,
    namespace: Option<&(String, String)>,
    content: Option<&str>,
) -> Result<SharedDocument> {
    let ns = namespace
        .map(|(prefix, uri)| format!(" xmlns:{prefix}='{uri}'"))
        .unwrap_or_default();
    let text = match content {
        Some(text) if !text.is_empty() => {
            if ns.is_empty() || text.contains("xmlns") {
                text.to_string()
            } else {
                let open = format!("<{root_name}");
                text.replacen(&open, &format!("{open}{ns}"), 1)
            }
        }
        _ => format!("<{root_name}{ns}/>"),
    };
    match registry.parse_document(&text) {
        Ok(doc) => Ok(Rc::new(RefCell::new(doc))),
        Err(source) => {
            log::debug!("failed to parse content:\n{text}");
            Err(Error::Parse {
                content: text,
                source,
            })
        }
    }
}
