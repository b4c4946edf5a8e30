//! Evaluation of the expression tree against records.

use super::ast::{LogicalNode, Node, RelationalLeaf, Scope};
use crate::error::Result;
use crate::record::Record;
use crate::value::Value;

impl LogicalNode {
    /// Every child is evaluated before the operator reduces the results.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> Result<bool> {
        let results = self
            .children()
            .iter()
            .map(|child| child.matches(record))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.operator().reduce(&results))
    }

    /// Scopes of the matching leaves; empty when this node does not match.
    pub fn matching_fields<R: Record + ?Sized>(&self, record: &R) -> Result<Vec<Scope>> {
        if !self.matches(record)? {
            return Ok(Vec::new());
        }

        let mut fields = Vec::new();
        for child in self.children() {
            if child.matches(record)? {
                fields.extend(child.matching_fields(record)?);
            }
        }
        Ok(fields)
    }
}

impl RelationalLeaf {
    /// A bound field tests its own value. An all-fields leaf matches when any record value
    /// passes, or when every value passes once inverted.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> Result<bool> {
        match self.scope() {
            Scope::Field(field) => match record.value_of(field) {
                Some(value) => self.test(&value),
                None => Ok(self.is_inverted()),
            },
            Scope::All => {
                let values = record.all_values();
                if self.is_inverted() {
                    for value in &values {
                        if !self.test(value)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                } else {
                    for value in &values {
                        if self.test(value)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
            }
        }
    }

    pub fn matching_fields<R: Record + ?Sized>(&self, record: &R) -> Result<Vec<Scope>> {
        if self.matches(record)? {
            Ok(vec![self.scope().clone()])
        } else {
            Ok(Vec::new())
        }
    }

    fn test(&self, actual: &Value) -> Result<bool> {
        let matched = self
            .converter()
            .matches(self.scope().field(), self.operator(), self.operand(), actual)
            .map_err(|err| {
                err.into_search_error(
                    self.scope().label(),
                    &actual.to_string(),
                    self.operator(),
                    self.converter().name(),
                )
            })?;
        Ok(self.is_inverted() ^ matched)
    }
}

impl Node {
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> Result<bool> {
        match self {
            Node::Logical(node) => node.matches(record),
            Node::Relational(leaf) => leaf.matches(record),
        }
    }

    pub fn matching_fields<R: Record + ?Sized>(&self, record: &R) -> Result<Vec<Scope>> {
        match self {
            Node::Logical(node) => node.matching_fields(record),
            Node::Relational(leaf) => leaf.matching_fields(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{Conversion, NumberConverter, TextConverter};
    use crate::dsl::{LogicalOperator, RelationalOperator};
    use crate::error::SearchError;
    use crate::plan::Field;
    use crate::record::MapRecord;
    use crate::value::{FieldType, Operand};
    use std::sync::Arc;

    fn status_leaf(operator: RelationalOperator, operand: Operand, inverted: bool) -> RelationalLeaf {
        RelationalLeaf::new(
            Scope::Field(Arc::new(Field::new("status", FieldType::Text))),
            Conversion {
                operator,
                operand,
                inverted,
            },
            Arc::new(TextConverter),
        )
    }

    fn all_leaf(operand: Operand, inverted: bool) -> RelationalLeaf {
        let operator = match operand {
            Operand::List(_) => RelationalOperator::List,
            _ => RelationalOperator::Like,
        };
        RelationalLeaf::new(
            Scope::All,
            Conversion {
                operator,
                operand,
                inverted,
            },
            Arc::new(TextConverter),
        )
    }

    fn status(value: &str) -> MapRecord {
        MapRecord::new().with("status", value)
    }

    #[test]
    fn inversion_flips_the_converter_result() {
        let leaf = status_leaf(
            RelationalOperator::Like,
            Operand::Scalar(Value::from("open")),
            true,
        );
        assert!(!leaf.matches(&status("open")).unwrap());
        assert!(leaf.matches(&status("closed")).unwrap());
    }

    #[test]
    fn missing_value_only_matches_inverted_leaves() {
        let plain = status_leaf(RelationalOperator::Like, Operand::Scalar(Value::from("open")), false);
        let inverted = status_leaf(RelationalOperator::Like, Operand::Scalar(Value::from("open")), true);
        let record = MapRecord::new().with("other", "open");
        assert!(!plain.matches(&record).unwrap());
        assert!(inverted.matches(&record).unwrap());
    }

    #[test]
    fn all_fields_any_versus_all() {
        let record = MapRecord::new().with("a", "open issue").with("b", "closed");
        let plain = all_leaf(Operand::Scalar(Value::from("open")), false);
        let inverted = all_leaf(Operand::Scalar(Value::from("open")), true);
        assert!(plain.matches(&record).unwrap());
        // "!open" needs every value to lack "open".
        assert!(!inverted.matches(&record).unwrap());
        assert!(inverted.matches(&MapRecord::new().with("b", "closed")).unwrap());
    }

    #[test]
    fn logical_node_reduces_children() {
        let open = Node::Relational(status_leaf(RelationalOperator::Like, Operand::Scalar(Value::from("open")), false));
        let closed = Node::Relational(status_leaf(RelationalOperator::Like, Operand::Scalar(Value::from("closed")), false));
        let or = LogicalNode::new(Some(LogicalOperator::Or), vec![open.clone(), closed.clone()]);
        let and = LogicalNode::new(Some(LogicalOperator::And), vec![open, closed]);

        assert!(or.matches(&status("closed")).unwrap());
        assert!(!and.matches(&status("closed")).unwrap());
        assert!(LogicalNode::default().matches(&status("x")).unwrap());
    }

    #[test]
    fn matching_fields_lists_matching_children_only() {
        let field = Arc::new(Field::new("status", FieldType::Text));
        let open = Node::Relational(status_leaf(RelationalOperator::Like, Operand::Scalar(Value::from("open")), false));
        let anywhere = Node::Relational(all_leaf(Operand::Scalar(Value::from("bug")), false));
        let or = LogicalNode::new(Some(LogicalOperator::Or), vec![open, anywhere]);

        let record = MapRecord::new().with("status", "open").with("kind", "feature");
        assert_eq!(or.matching_fields(&record).unwrap(), vec![Scope::Field(Arc::clone(&field))]);

        let record = MapRecord::new().with("status", "open").with("kind", "bug");
        assert_eq!(
            or.matching_fields(&record).unwrap(),
            vec![Scope::Field(field), Scope::All]
        );

        let record = MapRecord::new().with("status", "closed");
        assert!(or.matching_fields(&record).unwrap().is_empty());
    }

    #[test]
    fn incompatible_record_value_surfaces_as_error() {
        let leaf = RelationalLeaf::new(
            Scope::Field(Arc::new(Field::new("age", FieldType::Integer))),
            Conversion {
                operator: RelationalOperator::Interval,
                operand: Operand::Interval(Value::Integer(18), Value::Integer(30)),
                inverted: false,
            },
            Arc::new(NumberConverter),
        );
        let err = leaf.matches(&MapRecord::new().with("age", "unknown")).unwrap_err();
        assert!(matches!(
            err,
            SearchError::Conversion { ref field, ref raw, operator: RelationalOperator::Interval, .. }
                if field == "age" && raw == "unknown"
        ));
    }
}
