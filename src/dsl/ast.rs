//! Expression tree produced by the parser.

use std::fmt;
use std::sync::Arc;

use super::operator::{LogicalOperator, RelationalOperator};
use crate::convert::{Conversion, Converter};
use crate::error::ALL_FIELDS;
use crate::plan::Field;
use crate::value::Operand;

/// What a relational leaf looks at: one field, or every value of the record.
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    Field(Arc<Field>),
    All,
}

impl Scope {
    pub fn field(&self) -> Option<&Field> {
        match self {
            Scope::Field(field) => Some(field),
            Scope::All => None,
        }
    }

    /// Field name, or `[all]`.
    pub fn label(&self) -> &str {
        match self {
            Scope::Field(field) => field.name(),
            Scope::All => ALL_FIELDS,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tests one field (or all fields) against a converted operand.
#[derive(Debug, Clone)]
pub struct RelationalLeaf {
    scope: Scope,
    operator: RelationalOperator,
    operand: Operand,
    inverted: bool,
    converter: Arc<dyn Converter>,
}

impl RelationalLeaf {
    pub fn new(scope: Scope, conversion: Conversion, converter: Arc<dyn Converter>) -> Self {
        Self {
            scope,
            operator: conversion.operator,
            operand: conversion.operand,
            inverted: conversion.inverted,
            converter,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn operator(&self) -> RelationalOperator {
        self.operator
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Converter bound when the leaf was parsed.
    pub fn converter(&self) -> &Arc<dyn Converter> {
        &self.converter
    }
}

/// AND/OR over an ordered list of children.
#[derive(Debug, Clone, Default)]
pub struct LogicalNode {
    operator: Option<LogicalOperator>,
    children: Vec<Node>,
}

impl LogicalNode {
    pub fn new(operator: Option<LogicalOperator>, children: Vec<Node>) -> Self {
        Self { operator, children }
    }

    /// Effective operator: AND when none was set or there is at most one child.
    pub fn operator(&self) -> LogicalOperator {
        match self.operator {
            Some(operator) if self.children.len() > 1 => operator,
            _ => LogicalOperator::And,
        }
    }

    /// The operator as written, if any.
    pub fn explicit_operator(&self) -> Option<LogicalOperator> {
        self.operator
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Every scope referenced below this node, in expression order.
    pub fn fields(&self) -> Vec<Scope> {
        self.children.iter().flat_map(Node::fields).collect()
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Logical(LogicalNode),
    Relational(RelationalLeaf),
}

impl Node {
    pub fn fields(&self) -> Vec<Scope> {
        match self {
            Node::Logical(node) => node.fields(),
            Node::Relational(leaf) => vec![leaf.scope.clone()],
        }
    }
}

impl fmt::Display for LogicalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let operator = self.operator();
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", operator)?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for RelationalLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            write!(f, "!")?;
        }
        write!(f, "{} {} ", self.scope, self.operator)?;
        match &self.operand {
            Operand::Scalar(value) => write!(f, "{}", value),
            Operand::Interval(low, high) => write!(f, "{}..{}", low, high),
            Operand::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Logical(node) => write!(f, "{}", node),
            Node::Relational(leaf) => write!(f, "{}", leaf),
        }
    }
}
