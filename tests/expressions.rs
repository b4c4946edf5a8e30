use std::sync::Arc;
use std::thread;

use sieve::convert::{ConvertError, Converter, ConverterRegistry};
use sieve::dsl::{LogicalOperator, Node, OperatorResolver, RelationalOperator};
use sieve::value::Operand;
use sieve::{Field, FieldType, MapRecord, Parser, Plan, Scope, SearchError, Value, parse_expression};

fn people_plan() -> Plan {
    let mut plan = Plan::with_defaults();
    plan.add_field(Field::new("name", FieldType::Text));
    plan.add_field(Field::new("status", FieldType::Text));
    plan.add_field(Field::new("code", FieldType::Text).case_sensitive(true));
    plan.add_field(Field::new("age", FieldType::Integer));
    plan.add_field(Field::new("score", FieldType::Float));
    plan.add_field(Field::new("joined", FieldType::Date));
    plan.add_field(Field::new("vip", FieldType::Boolean));
    for name in ["a", "b", "c"] {
        plan.add_field(
            Field::new(name, FieldType::Integer).with_default_operator(RelationalOperator::Equals),
        );
    }
    plan
}

fn matches(plan: &Plan, expression: &str, record: &MapRecord) -> bool {
    parse_expression(plan, expression)
        .unwrap()
        .matches(record)
        .unwrap()
}

#[test]
fn leaves_without_operators_form_one_implicit_and() {
    let plan = people_plan();
    let tree = parse_expression(&plan, "name:john status:open,closed age:18-30 anything").unwrap();

    assert_eq!(tree.explicit_operator(), None);
    assert_eq!(tree.operator(), LogicalOperator::And);
    assert_eq!(tree.children().len(), 4);
    assert!(tree.children().iter().all(|child| matches!(child, Node::Relational(_))));
}

#[test]
fn list_matches_any_element() {
    let plan = people_plan();
    let tree = parse_expression(&plan, "status:open,closed").unwrap();
    let Node::Relational(leaf) = &tree.children()[0] else {
        panic!("expected a leaf");
    };
    assert_eq!(leaf.operator(), RelationalOperator::List);
    assert_eq!(
        leaf.operand(),
        &Operand::List(vec![Value::from("open"), Value::from("closed")])
    );

    assert!(tree.matches(&MapRecord::new().with("status", "closed")).unwrap());
    assert!(!tree.matches(&MapRecord::new().with("status", "pending")).unwrap());
}

#[test]
fn interval_bounds_are_inclusive() {
    let plan = people_plan();
    let tree = parse_expression(&plan, "age:18-30").unwrap();
    for (age, expected) in [(25, true), (18, true), (30, true), (31, false), (17, false)] {
        let record = MapRecord::new().with("age", age as i64);
        assert_eq!(tree.matches(&record).unwrap(), expected, "age {age}");
    }
}

#[test]
fn interval_over_floats_and_dates() {
    let plan = people_plan();
    let record = MapRecord::new()
        .with("score", 2.5)
        .with("joined", "2021-06-15");

    assert!(matches(&plan, "score:1.5-3", &record));
    assert!(!matches(&plan, "score:3-4.5", &record));
    assert!(matches(&plan, "joined:2021/01/01-2021/12/31", &record));
    assert!(!matches(&plan, "joined:2022.01.01-2022.12.31", &record));
}

#[test]
fn negation_inverts_the_match() {
    let plan = people_plan();
    assert!(!matches(&plan, "status:!open", &MapRecord::new().with("status", "open")));
    assert!(matches(&plan, "status:!open", &MapRecord::new().with("status", "closed")));
}

#[test]
fn and_binds_tighter_than_or() {
    let plan = people_plan();
    let implicit = parse_expression(&plan, "a:1 AND b:2 OR c:3").unwrap();
    let explicit = parse_expression(&plan, "(a:1 AND b:2) OR c:3").unwrap();

    for (a, b, c) in [(1, 2, 9), (1, 9, 3), (9, 9, 9), (1, 9, 9), (9, 2, 3)] {
        let record: MapRecord = [("a", a as i64), ("b", b), ("c", c)].into_iter().collect();
        assert_eq!(
            implicit.matches(&record).unwrap(),
            explicit.matches(&record).unwrap(),
            "a={a} b={b} c={c}"
        );
    }
    let record: MapRecord = [("a", 9i64), ("b", 9), ("c", 9)].into_iter().collect();
    assert!(!implicit.matches(&record).unwrap());
}

#[test]
fn alternating_operators_keep_every_leaf() {
    let plan = people_plan();
    let tree = parse_expression(&plan, "a:1 OR b:2 AND c:3 OR name:x").unwrap();
    assert_eq!(tree.fields().len(), 4);

    let record: MapRecord = [("a", Value::Integer(9)), ("b", Value::Integer(9)), ("c", Value::Integer(9))]
        .into_iter()
        .chain([("name", Value::from("max"))])
        .collect();
    assert!(tree.matches(&record).unwrap());
}

#[test]
fn quoting_preserves_spaces() {
    let plan = people_plan();
    let tree = parse_expression(&plan, r#"name:"john doe""#).unwrap();
    assert_eq!(tree.children().len(), 1);

    assert!(tree.matches(&MapRecord::new().with("name", "John Doe")).unwrap());
    assert!(!tree.matches(&MapRecord::new().with("name", "John")).unwrap());
}

#[test]
fn bare_list_searches_every_value() {
    let plan = people_plan();
    let tree = parse_expression(&plan, "open,closed").unwrap();
    let Node::Relational(leaf) = &tree.children()[0] else {
        panic!("expected a leaf");
    };
    assert_eq!(leaf.scope(), &Scope::All);
    assert_eq!(leaf.operator(), RelationalOperator::List);

    let record = MapRecord::new().with("name", "max").with("note", "reopened ticket");
    assert!(tree.matches(&record).unwrap());
    let record = MapRecord::new().with("name", "max").with("note", "pending");
    assert!(!tree.matches(&record).unwrap());
}

#[test]
fn case_sensitivity_follows_the_field() {
    let plan = people_plan();
    let record = MapRecord::new().with("name", "ALICE").with("code", "AB-1");

    assert!(matches(&plan, "name:alice", &record));
    assert!(matches(&plan, "code:AB", &record));
    assert!(!matches(&plan, "code:ab", &record));
}

#[test]
fn boolean_fields() {
    let plan = people_plan();
    assert!(matches(&plan, "vip:yes", &MapRecord::new().with("vip", true)));
    assert!(!matches(&plan, "vip:false", &MapRecord::new().with("vip", true)));
}

#[test]
fn evaluation_is_idempotent() {
    let plan = people_plan();
    let tree = parse_expression(&plan, "status:open OR age:18-30 OR gold").unwrap();
    let record = MapRecord::new()
        .with("status", "open")
        .with("age", 25i64)
        .with("tier", "gold");

    let first = (tree.matches(&record).unwrap(), tree.matching_fields(&record).unwrap());
    for _ in 0..3 {
        assert_eq!(tree.matches(&record).unwrap(), first.0);
        assert_eq!(tree.matching_fields(&record).unwrap(), first.1);
    }
    let labels: Vec<_> = first.1.iter().map(Scope::label).collect();
    assert_eq!(labels, vec!["status", "age", "[all]"]);
}

#[test]
fn shared_tree_evaluates_from_many_threads() {
    let plan = people_plan();
    let tree = Arc::new(parse_expression(&plan, "age:18-30 AND status:open").unwrap());

    let handles: Vec<_> = (0..8i64)
        .map(|i| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                let record = MapRecord::new().with("age", 15 + i * 3).with("status", "open");
                (i, tree.matches(&record).unwrap())
            })
        })
        .collect();

    for handle in handles {
        let (i, matched) = handle.join().unwrap();
        let age = 15 + i * 3;
        assert_eq!(matched, (18..=30).contains(&age), "age {age}");
    }
}

#[test]
fn errors_carry_field_and_raw_text() {
    let plan = people_plan();

    let err = parse_expression(&plan, "age:abc").unwrap_err();
    assert_eq!(err.field(), Some("age"));
    assert!(matches!(err, SearchError::Conversion { ref raw, .. } if raw == "abc"));

    let err = parse_expression(&plan, "vip:true-false").unwrap_err();
    assert_eq!(err.field(), Some("vip"));

    let err = parse_expression(&plan, "(status:open").unwrap_err();
    assert!(matches!(err, SearchError::Syntax { .. }));

    let tree = parse_expression(&plan, "age:18-30").unwrap();
    let err = tree.matches(&MapRecord::new().with("age", "old")).unwrap_err();
    assert_eq!(err.operator(), Some(RelationalOperator::Interval));
}

#[test]
fn missing_converter_is_a_lookup_error() {
    let registry = Arc::new(ConverterRegistry::new());
    let mut plan = Plan::new(OperatorResolver::default(), registry);
    plan.add_field(Field::new("name", FieldType::Text));

    let err = parse_expression(&plan, "name:x").unwrap_err();
    assert!(matches!(err, SearchError::Lookup { ref field, .. } if field == "name"));
}

#[derive(Debug)]
struct ReversedText;

impl Converter for ReversedText {
    fn name(&self) -> &str {
        "reversed"
    }

    fn supports(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Text
    }

    fn parse(&self, _field_type: FieldType, raw: &str) -> Result<Value, ConvertError> {
        Ok(Value::Text(raw.chars().rev().collect()))
    }
}

#[test]
fn custom_converter_takes_priority_and_is_bound_at_parse_time() {
    let plan = people_plan();
    let reversed: Arc<dyn Converter> = Arc::new(ReversedText);
    plan.registry().register(Arc::clone(&reversed));

    let mut parser = Parser::new(&plan);
    parser.parse("name:nhoj").unwrap();
    plan.registry().unregister(&reversed);

    let record = MapRecord::new().with("name", "john");
    assert!(parser.matches(&record).unwrap());

    parser.parse("name:nhoj").unwrap();
    assert!(!parser.matches(&record).unwrap());
}
