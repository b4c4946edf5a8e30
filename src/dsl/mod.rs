//! Search expression DSL.
//!
//! Syntax:
//!   value                   - LIKE over every field of the record
//!   field:value             - LIKE, or the field's default operator
//!   field:a,b,c             - LIST: matches any element
//!   field:low-high          - INTERVAL, inclusive (ordered types only)
//!   field:!value            - inverted leaf
//!   field:"two words"       - quoted value, single or double quotes
//!   expr1 AND expr2         - AND (also implicit between space-separated leaves)
//!   expr1 OR expr2          - OR (note: lower precedence than AND)
//!   (expr)                  - grouping

mod ast;
mod eval;
mod operator;
mod parser;

pub use ast::{LogicalNode, Node, RelationalLeaf, Scope};
pub use operator::{
    DEFAULT_INTERVAL_SEPARATOR, DEFAULT_LIST_SEPARATOR, LogicalOperator, OperatorResolver,
    RelationalOperator,
};
pub use parser::{Parser, parse_expression};
