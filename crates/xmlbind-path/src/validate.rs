//! Validation functions for path expressions.

use thiserror::Error;

use crate::types::XPath;

/// Maximum allowed expression string length.
const MAX_EXPRESSION_LENGTH: usize = 1024;

/// Maximum allowed number of steps.
const MAX_PATH_LENGTH: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("path expression is too long")]
    ExpressionTooLong,
    #[error("path has too many steps")]
    PathTooLong,
    #[error("attribute step must be the last step")]
    AttributeNotLast,
}

/// Validate a raw path expression before parsing.
///
/// # Example
///
/// ```
/// use xmlbind_path::validate_expression;
///
/// validate_expression("./devices/disk[1]/@type").unwrap();
/// validate_expression(&"a/".repeat(600)).unwrap_err();
/// ```
pub fn validate_expression(expr: &str) -> Result<(), ValidationError> {
    if expr.len() > MAX_EXPRESSION_LENGTH {
        return Err(ValidationError::ExpressionTooLong);
    }
    Ok(())
}

/// Validate a parsed path.
///
/// # Errors
///
/// Returns an error if:
/// - The path exceeds the maximum length (256 steps)
/// - An attribute step appears anywhere but last
pub fn validate_path(path: &XPath) -> Result<(), ValidationError> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(ValidationError::PathTooLong);
    }
    let steps = path.steps();
    if let Some((_, head)) = steps.split_last() {
        if head.iter().any(|s| s.is_attribute()) {
            return Err(ValidationError::AttributeNotLast);
        }
    }
    Ok(())
}
