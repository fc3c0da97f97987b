//! Child node descriptors.

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use xmlbind_path::XPath;

use crate::error::Result;
use crate::registry::Registry;
use crate::schema::{Schema, SchemaInfo};

/// The schema type a child descriptor instantiates.
#[derive(Clone, Copy)]
pub struct ChildTarget {
    type_id: TypeId,
    type_name: &'static str,
    root_name: &'static str,
    resolve: fn(&Registry) -> Result<Arc<SchemaInfo>>,
}

impl ChildTarget {
    fn of<S: Schema>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: type_name::<S>(),
            root_name: S::ROOT_NAME,
            resolve: Registry::schema::<S>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn root_name(&self) -> &'static str {
        self.root_name
    }
}

/// A nested instance (`single`) or an ordered list of them (`many`).
///
/// Instances live at `relative/ROOT_NAME` below the owner; list members are
/// addressed as `relative/ROOT_NAME[n]`.
#[derive(Clone)]
pub struct ChildProperty {
    target: ChildTarget,
    relative: XPath,
    path: XPath,
    single: bool,
    problems: Vec<String>,
}

impl ChildProperty {
    pub fn single<S: Schema>(relative: &str) -> Self {
        Self::new(ChildTarget::of::<S>(), relative, true)
    }

    pub fn many<S: Schema>(relative: &str) -> Self {
        Self::new(ChildTarget::of::<S>(), relative, false)
    }

    fn new(target: ChildTarget, relative: &str, single: bool) -> Self {
        let mut problems = Vec::new();
        let relative = XPath::parse(relative).unwrap_or_else(|e| {
            problems.push(format!("invalid path {relative:?}: {e}"));
            XPath::root()
        });
        if relative.targets_attribute() {
            problems.push(format!("child location {relative} names an attribute"));
        }
        let path = relative.child(target.root_name);
        Self {
            target,
            relative,
            path,
            single,
            problems,
        }
    }

    pub fn target(&self) -> &ChildTarget {
        &self.target
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    /// Location of the owning container, relative to the owner.
    pub fn relative(&self) -> &XPath {
        &self.relative
    }

    /// Location of the child nodes themselves, without an index.
    pub fn path(&self) -> &XPath {
        &self.path
    }

    pub(crate) fn resolve(&self, registry: &Registry) -> Result<Arc<SchemaInfo>> {
        (self.target.resolve)(registry)
    }

    pub(crate) fn check(&self) -> std::result::Result<(), String> {
        match self.problems.first() {
            Some(problem) => Err(problem.clone()),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ChildProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildProperty")
            .field("target", &self.target.type_name)
            .field("path", &self.path.to_string())
            .field("single", &self.single)
            .finish()
    }
}
