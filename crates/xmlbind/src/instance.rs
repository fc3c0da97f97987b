use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::node::Node;
use crate::registry::Registry;
use crate::schema::Schema;

/// A [`Node`] known to be of schema `S`.
pub struct Instance<S: Schema> {
    node: Node,
    _schema: PhantomData<fn() -> S>,
}

impl<S: Schema> Instance<S> {
    /// Build mode, using the global registry.
    pub fn new() -> Result<Self> {
        Self::new_in(&Registry::global())
    }

    pub fn new_in(registry: &Arc<Registry>) -> Result<Self> {
        let schema = registry.schema::<S>()?;
        Node::build(registry, schema).map(Self::wrap)
    }

    /// Parse mode, using the global registry.
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_in(&Registry::global(), content)
    }

    pub fn parse_in(registry: &Arc<Registry>, content: &str) -> Result<Self> {
        let schema = registry.schema::<S>()?;
        Node::parse(registry, schema, content).map(Self::wrap)
    }

    pub fn from_node(node: Node) -> Result<Self> {
        if !node.is::<S>() {
            return Err(Error::TypeMismatch {
                expected: type_name::<S>(),
                found: node.type_name(),
            });
        }
        Ok(Self::wrap(node))
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    fn wrap(node: Node) -> Self {
        Self {
            node,
            _schema: PhantomData,
        }
    }
}

impl<S: Schema> Deref for Instance<S> {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl<S: Schema> DerefMut for Instance<S> {
    fn deref_mut(&mut self) -> &mut Node {
        &mut self.node
    }
}

impl<S: Schema> fmt::Debug for Instance<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}
