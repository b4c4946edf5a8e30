//! Single-pass parser for search expressions.
//!
//! Grammar (informal):
//!
//! expr      = term (" " logical_op " " term)*
//! term      = "(" expr ")" | leaf
//! leaf      = [field] ":" value | value
//! value     = quoted | bareword          (optionally prefixed by "!")
//! logical_op = "AND" | "OR"              (case-insensitive)
//!
//! The scanner tokenizes and builds the tree in the same pass. When AND and OR are mixed
//! without parentheses, the tree is rebalanced on the fly so that AND binds tighter.

use std::sync::Arc;

use super::ast::{LogicalNode, Node, RelationalLeaf, Scope};
use super::operator::LogicalOperator;
use crate::convert::convert;
use crate::error::{Result, SearchError};
use crate::plan::Plan;
use crate::record::Record;

/// Parses expressions against a plan and keeps the most recent tree for evaluation.
///
/// `parse` takes `&mut self`: one scan at a time per parser. The returned tree is immutable
/// and can be shared across threads.
#[derive(Debug)]
pub struct Parser<'p> {
    plan: &'p Plan,
    tree: Arc<LogicalNode>,
}

impl<'p> Parser<'p> {
    /// Until the first successful parse the tree is an empty AND, which matches everything.
    pub fn new(plan: &'p Plan) -> Self {
        Self {
            plan,
            tree: Arc::new(LogicalNode::default()),
        }
    }

    /// On failure the previous tree is kept.
    pub fn parse(&mut self, expression: &str) -> Result<Arc<LogicalNode>> {
        let tree = Arc::new(parse_expression(self.plan, expression)?);
        self.tree = Arc::clone(&tree);
        Ok(tree)
    }

    pub fn tree(&self) -> &Arc<LogicalNode> {
        &self.tree
    }

    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> Result<bool> {
        self.tree.matches(record)
    }

    pub fn matching_fields<R: Record + ?Sized>(&self, record: &R) -> Result<Vec<Scope>> {
        self.tree.matching_fields(record)
    }
}

/// Parse one expression into a tree.
pub fn parse_expression(plan: &Plan, expression: &str) -> Result<LogicalNode> {
    tracing::info!("Parsing expression '{}'", expression);

    let mut scan = Scan::new(plan);
    let mut length = 0;
    for (position, character) in expression.chars().enumerate() {
        scan.step(position, character)?;
        length = position + 1;
    }
    let tree = scan.finish(length)?;

    tracing::debug!("Final tree {}", tree);
    Ok(tree)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Expecting a field name or a bare value.
    Field,
    /// A field name was captured, expecting its value.
    Value,
}

/// Logical node under construction, addressed by index in the scan's arena.
#[derive(Default)]
struct Group {
    operator: Option<LogicalOperator>,
    children: Vec<Slot>,
}

enum Slot {
    Leaf(RelationalLeaf),
    Group(usize),
}

/// Saved on `(`: where the enclosing level resumes.
struct Level {
    current: usize,
    root: usize,
}

/// Scratch state of one parse call.
struct Scan<'p> {
    plan: &'p Plan,
    groups: Vec<Group>,
    /// Node new leaves attach to.
    current: usize,
    /// Root of the current nesting level.
    root: usize,
    stack: Vec<Level>,
    /// Field binding of the leaf being assembled.
    scope: Scope,
    word: String,
    quoted_word: bool,
    quote: Option<char>,
    mode: Mode,
}

impl<'p> Scan<'p> {
    fn new(plan: &'p Plan) -> Self {
        Self {
            plan,
            groups: vec![Group::default()],
            current: 0,
            root: 0,
            stack: Vec::new(),
            scope: Scope::All,
            word: String::new(),
            quoted_word: false,
            quote: None,
            mode: Mode::Field,
        }
    }

    fn step(&mut self, position: usize, character: char) -> Result<()> {
        tracing::trace!("Processing character '{}'", character);
        let quoted = self.quote.is_some();
        match character {
            '(' if !quoted => {
                self.check_operator();
                self.save_value()?;
                self.open_group();
            }
            ')' if !quoted => {
                self.save_value()?;
                self.close_group(position)?;
            }
            ':' if !quoted => self.bind_field(),
            '"' | '\'' if !quoted || self.quote == Some(character) => self.toggle_quote(character),
            ' ' if !quoted => {
                self.check_operator();
                self.save_value()?;
            }
            _ => self.word.push(character),
        }
        Ok(())
    }

    fn finish(mut self, length: usize) -> Result<LogicalNode> {
        self.save_value()?;
        if !self.stack.is_empty() {
            return Err(SearchError::Syntax {
                position: length,
                reason: format!("{} unclosed '('", self.stack.len()),
            });
        }
        let root = self.root;
        Ok(self.build(root))
    }

    fn clear_word(&mut self) {
        self.word.clear();
        self.quoted_word = false;
    }

    fn new_leaf(&mut self) {
        tracing::trace!("New relational operation");
        self.scope = Scope::All;
        self.mode = Mode::Field;
    }

    fn add_group(&mut self, operator: Option<LogicalOperator>, children: Vec<Slot>) -> usize {
        self.groups.push(Group { operator, children });
        self.groups.len() - 1
    }

    fn toggle_quote(&mut self, character: char) {
        if self.quote.is_none() {
            tracing::trace!("Activating quote mode for character {}", character);
            self.quote = Some(character);
            self.quoted_word = true;
        } else {
            tracing::trace!("Disabling quote mode for character {}", character);
            self.quote = None;
        }
    }

    /// The word before `:` names the field of the leaf being assembled.
    fn bind_field(&mut self) {
        let field = self.plan.field(&self.word);
        match field {
            Some(field) => {
                tracing::trace!("Save the field {} in the current relational operation", field.name());
                self.scope = Scope::Field(Arc::clone(field));
            }
            None => {
                tracing::debug!("Unknown field '{}', searching all fields", self.word);
                self.scope = Scope::All;
            }
        }
        self.mode = Mode::Value;
        self.clear_word();
    }

    /// Convert a pending word into a leaf of the current node. An empty word only ends the
    /// leaf being assembled.
    fn save_value(&mut self) -> Result<()> {
        if self.word.is_empty() {
            if self.mode == Mode::Value {
                tracing::debug!("Field {} has no value, dropping it", self.scope);
            }
            self.quoted_word = false;
            self.new_leaf();
            return Ok(());
        }

        let raw = std::mem::take(&mut self.word);
        self.quoted_word = false;
        tracing::trace!("Set value {} for the current relational operation", raw);

        let field = self.scope.field();
        let converter = self.plan.converter_for(field, &raw)?;
        let conversion = convert(converter.as_ref(), self.plan.resolver(), field, &raw)?;
        let scope = std::mem::replace(&mut self.scope, Scope::All);

        self.groups[self.current]
            .children
            .push(Slot::Leaf(RelationalLeaf::new(scope, conversion, converter)));
        self.new_leaf();
        Ok(())
    }

    /// A bare AND/OR word merges into the tree instead of becoming a value. After `field:`
    /// the word is always the value.
    fn check_operator(&mut self) {
        if self.quoted_word || self.mode == Mode::Value {
            return;
        }
        let Some(operator) = LogicalOperator::search(&self.word) else {
            return;
        };
        tracing::trace!("Found the operator {}", operator);
        self.clear_word();
        self.merge_operator(operator);
        self.mode = Mode::Field;
    }

    fn merge_operator(&mut self, operator: LogicalOperator) {
        let group = &self.groups[self.current];
        let (existing, children) = (group.operator, group.children.len());
        match existing {
            Some(existing) if existing == operator => {}
            Some(existing) if children > 1 => {
                tracing::debug!(
                    "Change of operator detected (current operation is {} and new one is {})",
                    existing,
                    operator
                );
                self.change_operator(existing, operator);
            }
            _ => {
                tracing::trace!("Set the operator {} for the current logical operation", operator);
                self.groups[self.current].operator = Some(operator);
            }
        }
    }

    fn change_operator(&mut self, existing: LogicalOperator, operator: LogicalOperator) {
        if operator.has_higher_priority(existing) {
            tracing::trace!(
                "Balance the operation tree because of a higher priority operator (operator {} > current {})",
                operator,
                existing
            );
            let last = self.groups[self.current].children.pop();
            let group = self.add_group(Some(operator), last.into_iter().collect());
            self.groups[self.current].children.push(Slot::Group(group));
            self.current = group;
        } else if self.current != self.root {
            tracing::trace!("Leave the nested {} operation for the level root", existing);
            self.current = self.root;
            self.merge_operator(operator);
        } else {
            tracing::trace!("Wrap the current logical operation in a new {} operation", operator);
            let group = self.add_group(Some(operator), vec![Slot::Group(self.current)]);
            self.current = group;
            self.root = group;
        }
    }

    fn open_group(&mut self) {
        tracing::trace!("Following an opening bracket save the current operation");
        self.stack.push(Level {
            current: self.current,
            root: self.root,
        });
        let group = self.add_group(None, Vec::new());
        self.current = group;
        self.root = group;
        self.clear_word();
        self.new_leaf();
    }

    fn close_group(&mut self, position: usize) -> Result<()> {
        tracing::trace!("Following a closing bracket restore the parent operation");
        let Some(level) = self.stack.pop() else {
            return Err(SearchError::Syntax {
                position,
                reason: "unmatched ')'".to_string(),
            });
        };
        let group = self.root;
        self.groups[level.current].children.push(Slot::Group(group));
        self.current = level.current;
        self.root = level.root;
        self.clear_word();
        self.new_leaf();
        Ok(())
    }

    fn build(&mut self, index: usize) -> LogicalNode {
        let group = std::mem::take(&mut self.groups[index]);
        let children = group
            .children
            .into_iter()
            .map(|slot| match slot {
                Slot::Leaf(leaf) => Node::Relational(leaf),
                Slot::Group(child) => Node::Logical(self.build(child)),
            })
            .collect();
        LogicalNode::new(group.operator, children)
    }
}
