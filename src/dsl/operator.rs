//! Logical and relational operators, and inference of the relational one from raw text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::plan::Field;

pub const DEFAULT_LIST_SEPARATOR: char = ',';
pub const DEFAULT_INTERVAL_SEPARATOR: char = '-';

/// Logical operator joining the children of a logical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    /// Binding strength: AND binds tighter than OR.
    pub fn priority(self) -> u8 {
        match self {
            LogicalOperator::And => 2,
            LogicalOperator::Or => 1,
        }
    }

    pub fn has_higher_priority(self, other: LogicalOperator) -> bool {
        self.priority() > other.priority()
    }

    /// Recognize an operator word, ignoring case and surrounding whitespace.
    pub fn search(word: &str) -> Option<LogicalOperator> {
        let word = word.trim();
        if word.eq_ignore_ascii_case("and") {
            Some(LogicalOperator::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(LogicalOperator::Or)
        } else {
            None
        }
    }

    /// Reduce child results: AND is vacuously true, OR vacuously false.
    pub fn reduce(self, values: &[bool]) -> bool {
        match self {
            LogicalOperator::And => values.iter().all(|v| *v),
            LogicalOperator::Or => values.iter().any(|v| *v),
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "AND"),
            LogicalOperator::Or => write!(f, "OR"),
        }
    }
}

/// How a leaf compares its converted value with a record value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationalOperator {
    Equals,
    Like,
    Interval,
    List,
}

impl RelationalOperator {
    /// Whether the operator consumes several converted values.
    pub fn is_collection(self) -> bool {
        matches!(self, RelationalOperator::Interval | RelationalOperator::List)
    }
}

impl fmt::Display for RelationalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationalOperator::Equals => write!(f, "EQUALS"),
            RelationalOperator::Like => write!(f, "LIKE"),
            RelationalOperator::Interval => write!(f, "INTERVAL"),
            RelationalOperator::List => write!(f, "LIST"),
        }
    }
}

/// Infers the relational operator of a leaf from its field and raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorResolver {
    list_separator: char,
    interval_separator: char,
}

impl Default for OperatorResolver {
    fn default() -> Self {
        Self {
            list_separator: DEFAULT_LIST_SEPARATOR,
            interval_separator: DEFAULT_INTERVAL_SEPARATOR,
        }
    }
}

impl OperatorResolver {
    pub fn new(list_separator: char, interval_separator: char) -> Self {
        Self {
            list_separator,
            interval_separator,
        }
    }

    pub fn list_separator(&self) -> char {
        self.list_separator
    }

    pub fn interval_separator(&self) -> char {
        self.interval_separator
    }

    /// `raw` must already have its negation prefix stripped.
    pub fn resolve(&self, field: Option<&Field>, raw: &str) -> RelationalOperator {
        let Some(field) = field else {
            return if raw.contains(self.list_separator) {
                RelationalOperator::List
            } else {
                RelationalOperator::Like
            };
        };

        let mut operator = field.default_operator().unwrap_or(RelationalOperator::Like);
        if field.field_type().is_ordered() && raw.contains(self.interval_separator) {
            operator = RelationalOperator::Interval;
        }
        if raw.contains(self.list_separator) {
            operator = RelationalOperator::List;
        }
        operator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldType;

    #[test]
    fn search_ignores_case_and_whitespace() {
        assert_eq!(LogicalOperator::search(" and "), Some(LogicalOperator::And));
        assert_eq!(LogicalOperator::search("Or"), Some(LogicalOperator::Or));
        assert_eq!(LogicalOperator::search("android"), None);
        assert_eq!(LogicalOperator::search(""), None);
    }

    #[test]
    fn reduce_empty_children() {
        assert!(LogicalOperator::And.reduce(&[]));
        assert!(!LogicalOperator::Or.reduce(&[]));
        assert!(LogicalOperator::Or.reduce(&[false, true]));
        assert!(!LogicalOperator::And.reduce(&[true, false]));
    }

    #[test]
    fn and_outranks_or() {
        assert!(LogicalOperator::And.has_higher_priority(LogicalOperator::Or));
        assert!(!LogicalOperator::Or.has_higher_priority(LogicalOperator::And));
        assert!(!LogicalOperator::And.has_higher_priority(LogicalOperator::And));
    }

    #[test]
    fn resolve_without_field() {
        let resolver = OperatorResolver::default();
        assert_eq!(resolver.resolve(None, "open,closed"), RelationalOperator::List);
        assert_eq!(resolver.resolve(None, "18-30"), RelationalOperator::Like);
        assert_eq!(resolver.resolve(None, "open"), RelationalOperator::Like);
    }

    #[test]
    fn resolve_with_field() {
        let resolver = OperatorResolver::default();
        let age = Field::new("age", FieldType::Integer);
        let name = Field::new("name", FieldType::Text);
        let status = Field::new("status", FieldType::Text)
            .with_default_operator(RelationalOperator::Equals);

        assert_eq!(resolver.resolve(Some(&age), "18-30"), RelationalOperator::Interval);
        assert_eq!(resolver.resolve(Some(&age), "18-30,40"), RelationalOperator::List);
        assert_eq!(resolver.resolve(Some(&age), "18"), RelationalOperator::Like);
        assert_eq!(resolver.resolve(Some(&name), "jean-luc"), RelationalOperator::Like);
        assert_eq!(resolver.resolve(Some(&status), "open"), RelationalOperator::Equals);
        assert_eq!(resolver.resolve(Some(&status), "open,closed"), RelationalOperator::List);
    }

    #[test]
    fn custom_separators() {
        let resolver = OperatorResolver::new(';', '~');
        let age = Field::new("age", FieldType::Integer);
        assert_eq!(resolver.resolve(Some(&age), "18~30"), RelationalOperator::Interval);
        assert_eq!(resolver.resolve(Some(&age), "18-30"), RelationalOperator::Like);
        assert_eq!(resolver.resolve(None, "a;b"), RelationalOperator::List);
    }

    #[test]
    fn collections() {
        assert!(RelationalOperator::List.is_collection());
        assert!(RelationalOperator::Interval.is_collection());
        assert!(!RelationalOperator::Like.is_collection());
        assert!(!RelationalOperator::Equals.is_collection());
    }
}
