use std::cmp::Ordering;

use super::{ConvertError, Converter, Ordered, parse_supported};
use crate::plan::Field;
use crate::value::{FieldType, Value};

/// Integers and floats. Record values given as text are parsed before comparing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberConverter;

pub(super) fn parse_integer(raw: &str) -> Result<Value, ConvertError> {
    raw.trim()
        .parse::<i64>()
        .map(Value::Integer)
        .map_err(|err| ConvertError::Invalid(format!("'{}' is not an integer: {}", raw, err)))
}

pub(super) fn parse_float(raw: &str) -> Result<Value, ConvertError> {
    raw.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|err| ConvertError::Invalid(format!("'{}' is not a number: {}", raw, err)))
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Result<Number, ConvertError> {
        match value {
            Value::Integer(n) => Ok(Number::Integer(*n)),
            Value::Float(n) => Ok(Number::Float(*n)),
            Value::Text(text) => match parse_integer(text) {
                Ok(Value::Integer(n)) => Ok(Number::Integer(n)),
                _ => match parse_float(text)? {
                    Value::Float(n) => Ok(Number::Float(n)),
                    other => Err(ConvertError::Invalid(format!("'{}' is not a number", other))),
                },
            },
            other => Err(ConvertError::Invalid(format!(
                "{} value '{}' is not a number",
                other.field_type(),
                other
            ))),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Float(n) => n,
        }
    }
}

impl Converter for NumberConverter {
    fn name(&self) -> &str {
        "number"
    }

    fn supports(&self, field_type: FieldType) -> bool {
        matches!(field_type, FieldType::Integer | FieldType::Float)
    }

    fn parse(&self, field_type: FieldType, raw: &str) -> Result<Value, ConvertError> {
        parse_supported(self, field_type, raw)
    }

    fn ordering(&self) -> Option<&dyn Ordered> {
        Some(self)
    }

    fn equals(&self, _field: Option<&Field>, expected: &Value, actual: &Value) -> Result<bool, ConvertError> {
        Ok(self.compare(expected, actual)? == Ordering::Equal)
    }
}

impl Ordered for NumberConverter {
    fn compare(&self, left: &Value, right: &Value) -> Result<Ordering, ConvertError> {
        match (Number::of(left)?, Number::of(right)?) {
            (Number::Integer(a), Number::Integer(b)) => Ok(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()).ok_or_else(|| {
                ConvertError::Invalid(format!("'{}' and '{}' cannot be ordered", left, right))
            }),
        }
    }
}
