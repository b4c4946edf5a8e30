use super::{ConvertError, Converter, scalar_parser};
use crate::plan::Field;
use crate::value::{FieldType, Value};

/// Booleans: no natural ordering, so no INTERVAL.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanConverter;

pub(super) fn parse_boolean(raw: &str) -> Result<Value, ConvertError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(Value::Boolean(true)),
        "false" | "no" | "0" => Ok(Value::Boolean(false)),
        _ => Err(ConvertError::Invalid(format!("'{}' is not a boolean", raw))),
    }
}

fn boolean_of(value: &Value) -> Result<bool, ConvertError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Integer(0) => Ok(false),
        Value::Integer(1) => Ok(true),
        Value::Text(text) => match parse_boolean(text)? {
            Value::Boolean(b) => Ok(b),
            other => Err(ConvertError::Invalid(format!("'{}' is not a boolean", other))),
        },
        other => Err(ConvertError::Invalid(format!(
            "{} value '{}' is not a boolean",
            other.field_type(),
            other
        ))),
    }
}

impl Converter for BooleanConverter {
    fn name(&self) -> &str {
        "boolean"
    }

    fn supports(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Boolean
    }

    fn parse(&self, _field_type: FieldType, raw: &str) -> Result<Value, ConvertError> {
        scalar_parser(FieldType::Boolean)(raw)
    }

    fn equals(&self, _field: Option<&Field>, expected: &Value, actual: &Value) -> Result<bool, ConvertError> {
        Ok(boolean_of(expected)? == boolean_of(actual)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_spellings() {
        assert_eq!(parse_boolean("TRUE").unwrap(), Value::Boolean(true));
        assert_eq!(parse_boolean("no").unwrap(), Value::Boolean(false));
        assert_eq!(parse_boolean(" 1 ").unwrap(), Value::Boolean(true));
        assert!(parse_boolean("maybe").is_err());
    }

    #[test]
    fn equals_coerces_record_values() {
        let yes = Value::Boolean(true);
        assert!(BooleanConverter.equals(None, &yes, &Value::from("yes")).unwrap());
        assert!(BooleanConverter.equals(None, &yes, &Value::Integer(1)).unwrap());
        assert!(!BooleanConverter.equals(None, &yes, &Value::Boolean(false)).unwrap());
        assert!(BooleanConverter.equals(None, &yes, &Value::Float(1.5)).is_err());
        assert!(BooleanConverter.ordering().is_none());
    }
}
