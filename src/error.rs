//! Error taxonomy for parsing and evaluating search expressions.

use thiserror::Error;

use crate::dsl::RelationalOperator;
use crate::value::FieldType;

/// Label used in errors and logs when a leaf searches across every field.
pub const ALL_FIELDS: &str = "[all]";

pub type Result<T, E = SearchError> = std::result::Result<T, E>;

/// Every failure is terminal for the `parse` or `matches` call that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// Malformed interval/list arity, or INTERVAL on a type without natural ordering.
    #[error("invalid {operator} value '{raw}' for {field}: {reason}")]
    Configuration {
        field: String,
        raw: String,
        operator: RelationalOperator,
        reason: String,
    },

    /// Raw text (or a record value) cannot be read as the target type.
    #[error("cannot convert '{raw}' for {field} ({operator}): {reason}")]
    Conversion {
        field: String,
        raw: String,
        operator: RelationalOperator,
        reason: String,
    },

    /// Neither a field-level converter nor a registered one supports the type.
    #[error("no converter found for {field} of type {field_type} (value '{raw}')")]
    Lookup {
        field: String,
        field_type: FieldType,
        raw: String,
    },

    #[error("operator {operator} is not supported by the {converter} converter for {field} (value '{raw}')")]
    OperatorUnsupported {
        field: String,
        raw: String,
        operator: RelationalOperator,
        converter: String,
    },

    /// Structural fault in the expression text, e.g. unbalanced parentheses.
    #[error("syntax error at position {position}: {reason}")]
    Syntax { position: usize, reason: String },
}

impl SearchError {
    /// Name of the field involved, `[all]` for all-fields leaves, `None` for syntax errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            SearchError::Configuration { field, .. }
            | SearchError::Conversion { field, .. }
            | SearchError::Lookup { field, .. }
            | SearchError::OperatorUnsupported { field, .. } => Some(field),
            SearchError::Syntax { .. } => None,
        }
    }

    pub fn operator(&self) -> Option<RelationalOperator> {
        match self {
            SearchError::Configuration { operator, .. }
            | SearchError::Conversion { operator, .. }
            | SearchError::OperatorUnsupported { operator, .. } => Some(*operator),
            SearchError::Lookup { .. } | SearchError::Syntax { .. } => None,
        }
    }
}
