//! Per-type contracts and their resolved descriptor tables.

use std::any::{type_name, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use xmlbind_path::is_name;

use crate::child::ChildProperty;
use crate::error::{Error, Result};
use crate::node::Node;
use crate::property::Property;

/// The declared contract of a document-backed type.
///
/// ```
/// use xmlbind::{ChildProperty, Declaration, Property, Schema};
///
/// struct Cpu;
///
/// impl Schema for Cpu {
///     const ROOT_NAME: &'static str = "cpu";
///     const PROP_ORDER: &'static [&'static str] = &["mode", "model"];
///
///     fn declare(decl: &mut Declaration) {
///         decl.property("mode", Property::new("./@mode"))
///             .property("model", Property::new("./model"));
///     }
/// }
/// ```
pub trait Schema: 'static {
    /// Element name of the instance's own node. A `prefix:` qualifier
    /// pulls in that prefix's namespace when the instance is created.
    const ROOT_NAME: &'static str;
    /// Field names emitted first, in this order.
    const PROP_ORDER: &'static [&'static str] = &[];
    /// Strip everything but printable ASCII from parsed content.
    const SANITIZE: bool = false;

    fn declare(decl: &mut Declaration);

    /// Consistency check over the whole instance.
    fn validate(_node: &Node) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Field {
    Scalar(Arc<Property>),
    Child(Arc<ChildProperty>),
}

/// Collects field declarations in order.
///
/// Re-declaring a name replaces the descriptor but keeps the name's original
/// position, so a schema can [`extend`](Self::extend) a base and override
/// some of its fields.
#[derive(Debug, Default)]
pub struct Declaration {
    fields: IndexMap<&'static str, Field>,
}

impl Declaration {
    /// Declare everything `S` declares.
    pub fn extend<S: Schema>(&mut self) -> &mut Self {
        S::declare(self);
        self
    }

    pub fn property(&mut self, name: &'static str, prop: Property) -> &mut Self {
        self.fields.insert(name, Field::Scalar(Arc::new(prop)));
        self
    }

    pub fn child(&mut self, name: &'static str, child: ChildProperty) -> &mut Self {
        self.fields.insert(name, Field::Child(Arc::new(child)));
        self
    }
}

/// Resolved descriptor table of one schema type, built once per registry.
pub struct SchemaInfo {
    type_id: TypeId,
    type_name: &'static str,
    root_name: &'static str,
    prop_order: &'static [&'static str],
    sanitize: bool,
    fields: IndexMap<&'static str, Field>,
    validate: fn(&Node) -> Result<()>,
}

impl SchemaInfo {
    pub(crate) fn build<S: Schema>() -> Result<Self> {
        let mut decl = Declaration::default();
        S::declare(&mut decl);
        let info = Self {
            type_id: TypeId::of::<S>(),
            type_name: type_name::<S>(),
            root_name: S::ROOT_NAME,
            prop_order: S::PROP_ORDER,
            sanitize: S::SANITIZE,
            fields: decl.fields,
            validate: S::validate,
        };
        info.check()?;
        Ok(info)
    }

    fn check(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::config(format!("{}: {msg}", self.type_name)));

        if !is_name(self.root_name) {
            return fail(format!("invalid root name {:?}", self.root_name));
        }
        for (name, field) in &self.fields {
            let checked = match field {
                Field::Scalar(prop) => prop.check(),
                Field::Child(child) => child.check(),
            };
            if let Err(problem) = checked {
                return fail(format!("field {name:?}: {problem}"));
            }
        }

        let mut ordered = HashSet::new();
        for key in self.prop_order {
            if !self.fields.contains_key(key) {
                return fail(format!("PROP_ORDER names undeclared field {key:?}"));
            }
            if !ordered.insert(key) {
                return fail(format!("PROP_ORDER lists {key:?} twice"));
            }
        }

        let mut targets = HashSet::new();
        for (name, child) in self.child_properties() {
            if !targets.insert(child.target().type_id()) {
                return fail(format!(
                    "{} is registered by more than one child field (again as {name:?})",
                    child.target().type_name()
                ));
            }
        }
        Ok(())
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

    pub fn prop_order(&self) -> &'static [&'static str] {
        self.prop_order
    }

    pub fn sanitize(&self) -> bool {
        self.sanitize
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub(crate) fn field_entry(&self, name: &str) -> Option<(&'static str, &Field)> {
        self.fields.get_key_value(name).map(|(k, v)| (*k, v))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Field)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    pub fn properties(&self) -> impl Iterator<Item = (&'static str, &Arc<Property>)> {
        self.fields.iter().filter_map(|(k, v)| match v {
            Field::Scalar(prop) => Some((*k, prop)),
            Field::Child(_) => None,
        })
    }

    pub fn child_properties(&self) -> impl Iterator<Item = (&'static str, &Arc<ChildProperty>)> {
        self.fields.iter().filter_map(|(k, v)| match v {
            Field::Child(child) => Some((*k, child)),
            Field::Scalar(_) => None,
        })
    }

    pub(crate) fn is_child(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(Field::Child(_)))
    }

    /// Field name under which `prop` is declared.
    pub fn property_name(&self, prop: &Arc<Property>) -> Result<&'static str> {
        self.properties()
            .find(|(_, p)| Arc::ptr_eq(p, prop))
            .map(|(name, _)| name)
            .ok_or_else(|| {
                Error::config(format!("{} does not declare {:?}", self.type_name, prop.expr()))
            })
    }

    /// Field name under which `child` is declared.
    pub fn child_property_name(&self, child: &Arc<ChildProperty>) -> Result<&'static str> {
        self.child_properties()
            .find(|(_, c)| Arc::ptr_eq(c, child))
            .map(|(name, _)| name)
            .ok_or_else(|| {
                Error::config(format!(
                    "{} does not declare a child field for {}",
                    self.type_name,
                    child.target().type_name()
                ))
            })
    }

    /// The list-valued child field holding instances of `target`.
    pub fn plural_for(&self, target: TypeId) -> Result<(&'static str, &Arc<ChildProperty>)> {
        self.child_properties()
            .find(|(_, c)| !c.is_single() && c.target().type_id() == target)
            .ok_or_else(|| {
                Error::config(format!("{} has no list field for that child type", self.type_name))
            })
    }

    pub(crate) fn run_validate(&self, node: &Node) -> Result<()> {
        (self.validate)(node)
    }

    /// Order in which fields are written when an instance is rendered.
    ///
    /// Start from the staged scalar fields in staging order. Walking
    /// `PROP_ORDER` back to front, each listed field is moved to the front if
    /// it is staged, and each listed child field is inserted at the front.
    /// Child fields not listed follow, sorted by name.
    pub fn emission_order<'a>(
        &self,
        staged: impl IntoIterator<Item = &'a &'static str>,
    ) -> Vec<&'static str> {
        let mut order: Vec<&'static str> = staged
            .into_iter()
            .copied()
            .filter(|name| !self.is_child(name))
            .collect();
        for key in self.prop_order.iter().rev() {
            if let Some(pos) = order.iter().position(|name| name == key) {
                let name = order.remove(pos);
                order.insert(0, name);
            } else if self.is_child(key) {
                order.insert(0, *key);
            }
        }
        let mut rest: Vec<&'static str> = self
            .child_properties()
            .map(|(name, _)| name)
            .filter(|name| !order.contains(name))
            .collect();
        rest.sort_unstable();
        order.extend(rest);
        order
    }
}

impl fmt::Debug for SchemaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaInfo")
            .field("type_name", &self.type_name)
            .field("root_name", &self.root_name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
