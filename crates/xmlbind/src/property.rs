//! Scalar field descriptors.
//!
//! A [`Property`] binds one leaf field to a path relative to its owning
//! instance and says how its text converts to and from a [`Value`].
//! Reads are lazy: in parse mode a field nobody has set is read straight
//! from the document. Writes are staged in the instance and only reach the
//! document when it is rendered.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use xmlbind_path::XPath;

use crate::error::{Error, Result};
use crate::node::Node;
use crate::observer::Access;
use crate::value::{parse_int, Value};

pub type DefaultFn = Arc<dyn Fn(&Node) -> Value + Send + Sync>;
pub type ValidateFn = Arc<dyn Fn(&Node, &Value) -> std::result::Result<(), String> + Send + Sync>;
pub type ConvertFn = Arc<dyn Fn(&Node, Value) -> Result<Value> + Send + Sync>;

/// Built-in text conversion of a field. At most one per field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Conversion {
    #[default]
    Text,
    /// Node existence maps to a boolean.
    Presence,
    /// Decimal or `0x` hexadecimal integer.
    Int,
    /// `"yes"` / `"no"` text maps to a boolean.
    YesNo,
    /// `"on"` / `"off"` text maps to a boolean.
    OnOff,
}

/// Declaration of a scalar field.
///
/// ```
/// use xmlbind::{Property, Value};
///
/// let vcpus = Property::new("./vcpu").int().default_value(1);
/// assert_eq!(vcpus.path().to_string(), "./vcpu");
/// assert!(vcpus.has_default());
/// ```
#[derive(Clone)]
pub struct Property {
    expr: String,
    path: XPath,
    conversion: Conversion,
    converter: Option<ConvertFn>,
    default: Option<DefaultFn>,
    default_name: Option<Value>,
    validator: Option<ValidateFn>,
    abspath: bool,
    problems: Vec<String>,
}

impl Property {
    /// A text field at `expr`, relative to the owning instance.
    ///
    /// An unparsable expression is reported when the owning schema is
    /// registered.
    pub fn new(expr: &str) -> Self {
        let mut problems = Vec::new();
        let path = XPath::parse(expr).unwrap_or_else(|e| {
            problems.push(format!("invalid path {expr:?}: {e}"));
            XPath::root()
        });
        Self {
            expr: expr.to_string(),
            path,
            conversion: Conversion::Text,
            converter: None,
            default: None,
            default_name: None,
            validator: None,
            abspath: false,
            problems,
        }
    }

    pub fn presence(self) -> Self {
        self.conversion(Conversion::Presence)
    }

    pub fn int(self) -> Self {
        self.conversion(Conversion::Int)
    }

    pub fn yes_no(self) -> Self {
        self.conversion(Conversion::YesNo)
    }

    pub fn on_off(self) -> Self {
        self.conversion(Conversion::OnOff)
    }

    fn conversion(mut self, conversion: Conversion) -> Self {
        if self.conversion != Conversion::Text {
            self.problems.push(format!(
                "conflicting conversions {:?} and {:?} on {:?}",
                self.conversion, conversion, self.expr
            ));
        } else {
            self.conversion = conversion;
        }
        self
    }

    /// Extra setter conversion, applied after the built-in one.
    pub fn convert<F>(mut self, f: F) -> Self
    where
        F: Fn(&Node, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.converter = Some(Arc::new(f));
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.default = Some(Arc::new(move |_| value.clone()));
        self
    }

    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Node) -> Value + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(f));
        self
    }

    /// Sentinel standing in for the computed default.
    ///
    /// Reads of an unset field in build mode return the sentinel, and
    /// setting the sentinel stores the computed default instead.
    pub fn default_name(mut self, sentinel: impl Into<Value>) -> Self {
        self.default_name = Some(sentinel.into());
        self
    }

    /// Validation run on caller-supplied values before conversion.
    pub fn validate_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Node, &Value) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    /// Normalize written text values to absolute filesystem paths.
    pub fn abspath(mut self) -> Self {
        self.abspath = true;
        self
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    pub fn path(&self) -> &XPath {
        &self.path
    }

    pub fn kind(&self) -> Conversion {
        self.conversion
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub(crate) fn check(&self) -> std::result::Result<(), String> {
        if let Some(problem) = self.problems.first() {
            return Err(problem.clone());
        }
        if self.default_name.is_some() && self.default.is_none() {
            return Err(format!("{:?} has a default_name but no default", self.expr));
        }
        Ok(())
    }

    /// Caller-facing read.
    pub(crate) fn read(&self, node: &Node, field: &'static str) -> Result<Value> {
        node.observe(field, Access::Read);
        let raw = if node.is_staged(field) || node.is_build() {
            match self.pending_default(node, field) {
                Some(value) => value,
                None => node.staged(field).cloned().unwrap_or_default(),
            }
        } else {
            node.read_document(&self.path, self.conversion == Conversion::Presence)?
        };
        self.convert_get(field, raw)
    }

    /// Caller-facing write. Validates, converts and stages.
    pub(crate) fn write(
        &self,
        node: &mut Node,
        field: &'static str,
        value: Value,
        validate: bool,
    ) -> Result<()> {
        node.observe(field, Access::Write);
        if validate {
            if let Some(validator) = &self.validator {
                validator(node, &value).map_err(|reason| Error::Validation {
                    field: field.to_string(),
                    reason,
                })?;
            }
        }
        let value = self.convert_set(node, field, value)?;
        let value = self.keep_int_family(node, field, value)?;
        node.stage(field, value);
        Ok(())
    }

    /// The default that applies to an unset field of a build-mode instance.
    /// The sentinel takes precedence over the computed value.
    pub(crate) fn pending_default(&self, node: &Node, field: &str) -> Option<Value> {
        if !node.is_build() || node.is_staged(field) {
            return None;
        }
        let default = self.default.as_ref()?;
        Some(match &self.default_name {
            Some(sentinel) => sentinel.clone(),
            None => default(node),
        })
    }

    pub(crate) fn convert_get(&self, field: &str, raw: Value) -> Result<Value> {
        if self.is_sentinel(&raw) {
            return Ok(raw);
        }
        match self.conversion {
            Conversion::Presence => Ok(Value::Bool(raw.is_truthy())),
            Conversion::Int => match raw {
                Value::Text(text) => parse_int(&text).ok_or_else(|| conversion_error(field, &text)),
                Value::Bool(b) => Ok(Value::Int(i64::from(b))),
                other => Ok(other),
            },
            Conversion::YesNo => Ok(text_flag(raw, "yes")),
            Conversion::OnOff => Ok(text_flag(raw, "on")),
            Conversion::Text => Ok(raw),
        }
    }

    pub(crate) fn convert_set(&self, node: &Node, field: &str, value: Value) -> Result<Value> {
        let value = if self.is_sentinel(&value) {
            self.default.as_ref().map_or(Value::Null, |f| f(node))
        } else if value.is_null() {
            value
        } else if self.abspath {
            match value {
                Value::Text(text) => Value::Text(absolutize(field, &text)?),
                other => other,
            }
        } else {
            match self.conversion {
                Conversion::OnOff => Value::from(if value.is_truthy() { "on" } else { "off" }),
                Conversion::YesNo => Value::from(if value.is_truthy() { "yes" } else { "no" }),
                Conversion::Int => match value {
                    Value::Text(text) => {
                        parse_int(&text).ok_or_else(|| conversion_error(field, &text))?
                    }
                    Value::Bool(b) => Value::Int(i64::from(b)),
                    other => other,
                },
                Conversion::Presence | Conversion::Text => value,
            }
        };
        match &self.converter {
            Some(convert) => convert(node, value),
            None => Ok(value),
        }
    }

    /// A plain integer written over document text in the `0x` family is
    /// staged as hex so it re-renders the way it was read.
    fn keep_int_family(&self, node: &Node, field: &str, value: Value) -> Result<Value> {
        let Value::Int(n) = value else {
            return Ok(value);
        };
        if self.conversion != Conversion::Int {
            return Ok(value);
        }
        let hex = match node.staged(field) {
            Some(staged) => matches!(staged, Value::Hex(_)),
            None if node.is_build() => false,
            None => matches!(
                node.read_document(&self.path, false)?,
                Value::Text(text) if text.contains("0x")
            ),
        };
        Ok(if hex { Value::Hex(n) } else { Value::Int(n) })
    }

    fn is_sentinel(&self, value: &Value) -> bool {
        self.default_name.as_ref().is_some_and(|s| s == value)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("expr", &self.expr)
            .field("conversion", &self.conversion)
            .field("default", &self.default.is_some())
            .field("default_name", &self.default_name)
            .field("abspath", &self.abspath)
            .finish_non_exhaustive()
    }
}

fn text_flag(raw: Value, truthy: &str) -> Value {
    match raw {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(b),
        other => Value::Bool(other.as_str() == Some(truthy)),
    }
}

fn conversion_error(field: &str, value: &str) -> Error {
    Error::Conversion {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Lexically absolute form of `path`: relative paths are joined onto the
/// current directory and `.`/`..` are folded. Symlinks are not resolved.
fn absolutize(field: &str, path: &str) -> Result<String> {
    let raw = Path::new(path);
    let joined = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|_| conversion_error(field, path))?
            .join(raw)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out.to_string_lossy().into_owned())
}
