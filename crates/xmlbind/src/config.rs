//! Engine configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const QEMU_PREFIX: &str = "qemu";
pub const QEMU_NAMESPACE: &str = "http://libvirt.org/schemas/domain/qemu/1.0";

/// Namespace prefix to URI table, consulted for root names like
/// `qemu:commandline`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespaces(IndexMap<String, String>);

impl Namespaces {
    /// An empty table.
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn insert(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> &mut Self {
        self.0.insert(prefix.into(), uri.into());
        self
    }

    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.0.get(prefix).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        let mut ns = Self::new();
        ns.insert(QEMU_PREFIX, QEMU_NAMESPACE);
        ns
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub namespaces: Namespaces,
    /// Run the schema validation hook before every render.
    pub validate_on_render: bool,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::config(format!("invalid config: {e}")))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Resolve the namespace of a `prefix:name` root name.
    ///
    /// Names without a prefix have no namespace. A prefix missing from the
    /// table is a configuration error.
    pub fn namespace_for(&self, root_name: &str) -> Result<Option<(String, String)>> {
        let Some((prefix, _)) = root_name.split_once(':') else {
            return Ok(None);
        };
        match self.namespaces.uri(prefix) {
            Some(uri) => Ok(Some((prefix.to_string(), uri.to_string()))),
            None => Err(Error::config(format!(
                "no namespace registered for prefix {prefix:?} of {root_name:?}"
            ))),
        }
    }
}
