//! Structured instances.
//!
//! A [`Node`] is one schema-typed object backed by a position in a
//! document. Its nested instances are created eagerly: a single child always
//! exists, list children exist for every matching node in parsed content.
//!
//! Field writes stay in the node's [`PropertyStore`] until
//! [`Node::render`] flushes them. A build-mode node flushes into a scratch
//! copy of its document and so never changes it. A parse-mode node
//! flushes into the live document it shares with its parent.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use xmlbind_path::{is_indexed, sibling_index, XPath};

use crate::adapter::DocumentAdapter;
use crate::child::ChildProperty;
use crate::error::{DocumentError, Error, Result};
use crate::instance::Instance;
use crate::observer::Access;
use crate::property::{Conversion, Property};
use crate::registry::Registry;
use crate::schema::{Field, Schema, SchemaInfo};
use crate::state::InstanceState;
use crate::value::Value;

/// Values set on a node and not yet written, in staging order.
///
/// Re-staging a field moves it to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStore {
    values: IndexMap<&'static str, Value>,
}

impl PropertyStore {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn stage(&mut self, field: &'static str, value: Value) {
        self.values.shift_remove(field);
        self.values.insert(field, value);
    }
}

/// Nested instances held under one child field.
#[derive(Debug)]
pub enum Children {
    Single(Box<Node>),
    Many(Vec<Node>),
}

impl Children {
    pub fn as_slice(&self) -> &[Node] {
        match self {
            Children::Single(node) => std::slice::from_ref(&**node),
            Children::Many(list) => list.as_slice(),
        }
    }

    fn as_mut_slice(&mut self) -> &mut [Node] {
        match self {
            Children::Single(node) => std::slice::from_mut(&mut **node),
            Children::Many(list) => list.as_mut_slice(),
        }
    }
}

pub struct Node {
    registry: Arc<Registry>,
    schema: Arc<SchemaInfo>,
    props: PropertyStore,
    state: InstanceState,
    children: IndexMap<&'static str, Children>,
}

impl Node {
    /// A standalone build-mode instance of `schema`.
    pub fn build(registry: &Arc<Registry>, schema: Arc<SchemaInfo>) -> Result<Self> {
        Self::standalone(registry, schema, None)
    }

    /// A standalone parse-mode instance rooted at `content`.
    pub fn parse(registry: &Arc<Registry>, schema: Arc<SchemaInfo>, content: &str) -> Result<Self> {
        Self::standalone(registry, schema, Some(content))
    }

    fn standalone(
        registry: &Arc<Registry>,
        schema: Arc<SchemaInfo>,
        content: Option<&str>,
    ) -> Result<Self> {
        let sanitized;
        let content = match content {
            Some(text) if schema.sanitize() => {
                sanitized = sanitize(text);
                Some(sanitized.as_str())
            }
            other => other,
        };
        let state = InstanceState::standalone(registry, schema.root_name(), content)?;
        Self::assemble(registry.clone(), schema, state)
    }

    /// Wrap `state` and create the nested instances below it.
    fn assemble(
        registry: Arc<Registry>,
        schema: Arc<SchemaInfo>,
        state: InstanceState,
    ) -> Result<Self> {
        let mut children = IndexMap::new();
        for (name, child) in schema.child_properties() {
            let target = child.resolve(&registry)?;
            let slot = if child.is_single() {
                let nested =
                    InstanceState::nested(&registry, &state, target.root_name(), child.path().clone())?;
                Children::Single(Box::new(Self::assemble(registry.clone(), target, nested)?))
            } else {
                let mut list = Vec::new();
                if !state.is_build() {
                    let count = state.document()?.count(&state.make_abs(child.path()))?;
                    for idx in 1..=count {
                        let rel = child.path().clone().with_index(idx);
                        let nested = InstanceState::nested(&registry, &state, target.root_name(), rel)?;
                        list.push(Self::assemble(registry.clone(), target.clone(), nested)?);
                    }
                }
                Children::Many(list)
            };
            children.insert(name, slot);
        }
        Ok(Self {
            registry,
            schema,
            props: PropertyStore::default(),
            state,
            children,
        })
    }

    pub fn schema(&self) -> &Arc<SchemaInfo> {
        &self.schema
    }

    pub fn type_name(&self) -> &'static str {
        self.schema.type_name()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn state(&self) -> &InstanceState {
        &self.state
    }

    pub fn is_build(&self) -> bool {
        self.state.is_build()
    }

    /// False while attached to a parent's document.
    pub fn owns_document(&self) -> bool {
        self.state.owns_document()
    }

    pub fn is<S: Schema>(&self) -> bool {
        self.schema.type_id() == TypeId::of::<S>()
    }

    pub fn store(&self) -> &PropertyStore {
        &self.props
    }

    /// Whether `field` has a staged value.
    pub fn is_set(&self, field: &str) -> bool {
        self.props.contains(field)
    }

    // Scalar fields.

    pub fn get(&self, field: &str) -> Result<Value> {
        let (name, prop) = self.property(field)?;
        prop.read(self, name)
    }

    pub fn get_str(&self, field: &str) -> Result<Option<String>> {
        Ok(match self.get(field)? {
            Value::Null => None,
            value => Some(value.to_string()),
        })
    }

    pub fn get_int(&self, field: &str) -> Result<Option<i64>> {
        Ok(self.get(field)?.as_int())
    }

    pub fn get_bool(&self, field: &str) -> Result<Option<bool>> {
        Ok(self.get(field)?.as_bool())
    }

    /// Validate, convert and stage a value.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let (name, prop) = self.property(field)?;
        prop.write(self, name, value.into(), true)
    }

    /// Convert and stage a value without running its validation callback.
    pub fn set_unvalidated(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let (name, prop) = self.property(field)?;
        prop.write(self, name, value.into(), false)
    }

    pub(crate) fn is_staged(&self, field: &str) -> bool {
        self.props.contains(field)
    }

    pub(crate) fn staged(&self, field: &str) -> Option<&Value> {
        self.props.get(field)
    }

    pub(crate) fn stage(&mut self, field: &'static str, value: Value) {
        self.props.stage(field, value);
    }

    pub(crate) fn observe(&self, field: &'static str, access: Access) {
        self.registry.observe(self.schema.type_name(), field, access);
    }

    pub(crate) fn read_document(&self, rel: &XPath, presence: bool) -> Result<Value> {
        let abs = self.state.make_abs(rel);
        let value = self.state.document()?.read(&abs, presence)?;
        Ok(value)
    }

    fn property(&self, field: &str) -> Result<(&'static str, Arc<Property>)> {
        match self.schema.field_entry(field) {
            Some((name, Field::Scalar(prop))) => Ok((name, prop.clone())),
            Some((name, Field::Child(_))) => Err(Error::config(format!(
                "{}.{name} is a child field, not a value",
                self.type_name()
            ))),
            None => Err(self.unknown(field)),
        }
    }

    fn child_field(&self, field: &str) -> Result<(&'static str, Arc<ChildProperty>)> {
        match self.schema.field_entry(field) {
            Some((name, Field::Child(child))) => Ok((name, child.clone())),
            Some((name, Field::Scalar(_))) => Err(Error::config(format!(
                "{}.{name} is a value field, not a child",
                self.type_name()
            ))),
            None => Err(self.unknown(field)),
        }
    }

    fn unknown(&self, field: &str) -> Error {
        Error::UnknownField {
            type_name: self.type_name(),
            field: field.to_string(),
        }
    }

    // Child fields.

    /// The instance under a single child field.
    pub fn child(&self, field: &str) -> Result<&Node> {
        match self.slot(field)? {
            Children::Single(node) => Ok(&**node),
            Children::Many(_) => Err(Error::config(format!("{field} is a list field"))),
        }
    }

    pub fn child_mut(&mut self, field: &str) -> Result<&mut Node> {
        match self.slot_mut(field)? {
            Children::Single(node) => Ok(&mut **node),
            Children::Many(_) => Err(Error::config(format!("{field} is a list field"))),
        }
    }

    /// The instances under a list child field, in document order.
    pub fn children(&self, field: &str) -> Result<&[Node]> {
        match self.slot(field)? {
            Children::Many(list) => Ok(list.as_slice()),
            Children::Single(_) => Err(Error::config(format!("{field} is a single child field"))),
        }
    }

    pub fn children_mut(&mut self, field: &str) -> Result<&mut [Node]> {
        Ok(self.list_mut(field)?.as_mut_slice())
    }

    fn list_mut(&mut self, field: &str) -> Result<&mut Vec<Node>> {
        match self.slot_mut(field)? {
            Children::Many(list) => Ok(list),
            Children::Single(_) => Err(Error::config(format!("{field} is a single child field"))),
        }
    }

    fn slot(&self, field: &str) -> Result<&Children> {
        self.children.get(field).ok_or_else(|| self.missing_child(field))
    }

    fn slot_mut(&mut self, field: &str) -> Result<&mut Children> {
        if !self.children.contains_key(field) {
            return Err(self.missing_child(field));
        }
        self.children
            .get_mut(field)
            .ok_or_else(|| Error::config(format!("{field} is not a child field")))
    }

    fn missing_child(&self, field: &str) -> Error {
        match self.child_field(field) {
            Ok(_) => self.unknown(field),
            Err(err) => err,
        }
    }

    // Graph mutation.

    /// A fresh, detached build-mode instance for a list child field.
    pub fn new_child(&self, field: &str) -> Result<Node> {
        let (name, child) = self.child_field(field)?;
        if child.is_single() {
            return Err(Error::config(format!(
                "{}.{name} is a single child field",
                self.type_name()
            )));
        }
        let target = child.resolve(&self.registry)?;
        Node::build(&self.registry, target)
    }

    /// Create a build-mode instance for a list child field and attach it.
    pub fn add_new(&mut self, field: &str) -> Result<&mut Node> {
        let node = self.new_child(field)?;
        self.attach(node)
    }

    /// Append `child` to the list field declared for its type.
    ///
    /// Under a parse-mode node the child gets a node in the live document
    /// right after its preceding sibling: its rendered content when it was
    /// parsed, an empty stub when it is built. Under a build-mode node
    /// nothing is spliced; a parsed child keeps its values by staging what
    /// it reads from its own document. Either way the child then shares
    /// this node's document and inherits build mode.
    pub fn attach(&mut self, child: impl Into<Node>) -> Result<&mut Node> {
        let mut node: Node = child.into();
        let (field, _) = self.schema.plural_for(node.schema.type_id())?;
        let fragment = if self.state.is_build() {
            node.capture_document()?;
            None
        } else if node.is_build() {
            Some(format!("<{}/>", node.state.root_name()))
        } else {
            Some(node.render()?)
        };
        log::trace!("attaching {} to {} under {field}", node.type_name(), self.xml_id());

        self.list_mut(field)?.push(node);
        self.set_child_xpaths();

        let Node { state, children, .. } = self;
        let node = match children.get_mut(field) {
            Some(Children::Many(list)) => list.last_mut(),
            _ => None,
        }
        .ok_or_else(|| Error::config(format!("{field} is not a list field")))?;
        if let Some(fragment) = fragment {
            state
                .document_mut()?
                .insert_rendered(&fragment, &node.state.abs_xpath())?;
        }
        node.parse_with_children(None, Some(&*state))?;
        Ok(node)
    }

    /// Stage every value this parse-mode subtree reads from its document.
    fn capture_document(&mut self) -> Result<()> {
        if self.is_build() {
            return Ok(());
        }
        let schema = self.schema.clone();
        for (name, prop) in schema.properties() {
            if self.props.contains(name) {
                continue;
            }
            let presence = prop.kind() == Conversion::Presence;
            match self.read_document(prop.path(), presence)? {
                Value::Null | Value::Bool(false) => {}
                raw => self.props.stage(name, raw),
            }
        }
        for slot in self.children.values_mut() {
            for node in slot.as_mut_slice() {
                node.capture_document()?;
            }
        }
        Ok(())
    }

    /// Remove the `index`-th instance of a list field.
    ///
    /// Its node is deleted from this document and the returned instance
    /// gets a private document parsed from its rendered content. Later
    /// siblings move up one position.
    pub fn detach(&mut self, field: &str, index: usize) -> Result<Node> {
        let list = self.list_mut(field)?;
        let Some(target) = list.get(index) else {
            return Err(Error::NoSuchChild {
                field: field.to_string(),
                index,
            });
        };
        let xml = target.render()?;
        let mut node = list.remove(index);
        let xpath = node.state.abs_xpath();
        log::trace!("detaching {} at {xpath}", node.type_name());

        node.set_xpaths(&XPath::root(), Some(XPath::root()));
        node.parse_with_children(Some(&xml), None)?;
        self.state.document_mut()?.remove_node(&xpath)?;
        self.set_child_xpaths();
        Ok(node)
    }

    /// [`detach`](Self::detach) from the list field holding `S`.
    pub fn detach_as<S: Schema>(&mut self, index: usize) -> Result<Instance<S>> {
        let (field, _) = self.schema.plural_for(TypeId::of::<S>())?;
        let node = self.detach(field, index)?;
        Instance::from_node(node)
    }

    /// Renumber every nested instance after the list membership changed.
    fn set_child_xpaths(&mut self) {
        let abs = self.state.abs_xpath();
        let Node {
            schema, children, ..
        } = self;
        for (name, slot) in children.iter_mut() {
            let Some(Field::Child(child)) = schema.field(name) else {
                continue;
            };
            match slot {
                Children::Single(node) => node.set_xpaths(&abs, Some(child.path().clone())),
                Children::Many(list) => {
                    for (i, node) in list.iter_mut().enumerate() {
                        node.set_xpaths(&abs, Some(child.path().clone().with_index(i + 1)));
                    }
                }
            }
        }
    }

    fn set_xpaths(&mut self, parent: &XPath, relative: Option<XPath>) {
        self.state.set_parent_xpath(parent.clone());
        if let Some(relative) = relative {
            self.state.set_relative_xpath(relative);
        }
        let abs = self.state.abs_xpath();
        for slot in self.children.values_mut() {
            for node in slot.as_mut_slice() {
                node.set_xpaths(&abs, None);
            }
        }
    }

    /// Point this subtree at a document: the parent's when given, else a
    /// private one parsed from `content`.
    fn parse_with_children(
        &mut self,
        content: Option<&str>,
        parent: Option<&InstanceState>,
    ) -> Result<()> {
        match parent {
            Some(parent) => self.state.borrow_from(parent),
            None => self.state.reparse(&self.registry, content)?,
        }
        let Node {
            state, children, ..
        } = self;
        for slot in children.values_mut() {
            for node in slot.as_mut_slice() {
                node.parse_with_children(None, Some(&*state))?;
            }
        }
        Ok(())
    }

    /// Unset every staged value, empty the nested instances and drop this
    /// node's content.
    ///
    /// List members and `leave_stub` keep an empty node in place so sibling
    /// positions stay valid; otherwise the node is removed.
    pub fn reset(&mut self, leave_stub: bool) -> Result<()> {
        log::trace!("resetting {} at {}", self.type_name(), self.xml_id());
        let schema = self.schema.clone();
        for (name, prop) in schema.properties() {
            if self.props.contains(name) {
                prop.write(self, name, Value::Null, true)?;
            }
        }
        for (name, child) in schema.child_properties() {
            if child.is_single() {
                self.child_mut(name)?.reset(false)?;
            } else {
                while !self.children(name)?.is_empty() {
                    self.detach(name, 0)?;
                }
            }
        }

        let abs = self.state.abs_xpath();
        let mut doc = self.state.document_mut()?;
        if is_indexed(&abs) || leave_stub {
            doc.clear_node(&abs)?;
        } else {
            doc.remove_node(&abs)?;
        }
        Ok(())
    }

    /// Run the schema's validation hook.
    pub fn validate(&self) -> Result<()> {
        self.schema.run_validate(self)
    }

    // Emission.

    /// Flush staged values and serialize this node's subtree.
    ///
    /// Rendering twice without changes in between gives the same text.
    pub fn render(&self) -> Result<String> {
        if self.registry.config().validate_on_render {
            self.validate()?;
        }
        let mut writes = Vec::new();
        self.plan_flush(&mut writes)?;
        let abs = self.state.abs_xpath();
        log::trace!("rendering {} at {abs} with {} writes", self.type_name(), writes.len());

        let mut out = if self.state.is_build() {
            let mut scratch = self.state.document()?.duplicate();
            apply(&mut *scratch, &writes)?;
            scratch.render(&abs)?
        } else {
            let mut doc = self.state.document_mut()?;
            apply(&mut **doc, &writes)?;
            doc.render(&abs)?
        };
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }

    /// Collect the writes a flush of this subtree performs, in order.
    ///
    /// Build-mode defaults are applied to a copy of the store, so planning
    /// never changes the node.
    fn plan_flush(&self, out: &mut Vec<(XPath, Value)>) -> Result<()> {
        let mut staged = self.props.clone();
        for (name, prop) in self.schema.properties() {
            if let Some(default) = prop.pending_default(self, name) {
                let value = prop.convert_set(self, name, default)?;
                staged.stage(name, value);
            }
        }

        for name in self.schema.emission_order(staged.values.keys()) {
            match self.schema.field(name) {
                Some(Field::Scalar(prop)) => {
                    if let Some(value) = staged.get(name) {
                        out.push((self.state.make_abs(prop.path()), value.clone()));
                    }
                }
                Some(Field::Child(_)) => {
                    if let Some(slot) = self.children.get(name) {
                        for node in slot.as_slice() {
                            node.plan_flush(out)?;
                        }
                    }
                }
                None => {}
            }
        }
        Ok(())
    }

    // Identity.

    /// Absolute position of this node in its document.
    pub fn position(&self) -> XPath {
        self.state.abs_xpath()
    }

    /// Stable identifier for this node. It changes only when the node moves.
    pub fn xml_id(&self) -> String {
        self.position().to_string()
    }

    /// Zero-based rank among same-named siblings.
    pub fn xml_idx(&self) -> usize {
        sibling_index(&self.position())
    }
}

fn apply(doc: &mut dyn DocumentAdapter, writes: &[(XPath, Value)]) -> Result<(), DocumentError> {
    for (path, value) in writes {
        doc.write(path, value)?;
    }
    Ok(())
}

/// Keep printable ASCII and ASCII whitespace only.
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_graphic() || matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'))
        .collect()
}

impl<S: Schema> From<Instance<S>> for Node {
    fn from(instance: Instance<S>) -> Self {
        instance.into_node()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("type", &self.type_name())
            .field("position", &self.xml_id())
            .field("build", &self.state.is_build())
            .field("staged", &self.props)
            .finish_non_exhaustive()
    }
}
