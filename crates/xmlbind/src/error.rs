//! Error types.

use thiserror::Error;
use xmlbind_path::PathError;
use xmlbind_tree::{ParseError, TreeError};

/// Failures reported by a [`DocumentAdapter`](crate::DocumentAdapter).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document handle is already in use")]
    Busy,
    #[error("no node at {0}")]
    NotFound(String),
    #[error("malformed content: {0}")]
    Malformed(#[from] ParseError),
    #[error(transparent)]
    Tree(TreeError),
    #[error(transparent)]
    Path(#[from] PathError),
}

impl From<TreeError> for DocumentError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::Parse(inner) => DocumentError::Malformed(inner),
            other => DocumentError::Tree(other),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A schema declaration or lookup is inconsistent. Never retried.
    #[error("configuration error: {0}")]
    Config(String),
    /// A value was rejected by a field's validation callback or by a
    /// schema-level validation hook.
    #[error("invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },
    #[error("cannot convert {value:?} for {field}")]
    Conversion { field: String, value: String },
    /// Literal content could not be parsed into a document.
    #[error("failed to parse content: {source}\n{content}")]
    Parse {
        content: String,
        #[source]
        source: DocumentError,
    },
    #[error("{type_name} has no field {field:?}")]
    UnknownField {
        type_name: &'static str,
        field: String,
    },
    #[error("{field} has no child at index {index}")]
    NoSuchChild { field: String, index: usize },
    #[error("expected a {expected} instance, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Document(#[from] DocumentError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
