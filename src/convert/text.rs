use super::{ConvertError, Converter, representation, scalar_parser};
use crate::plan::Field;
use crate::value::{FieldType, Value};

/// Text kept verbatim; EQUALS compares textual forms, honouring case sensitivity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextConverter;

pub(super) fn parse_text(raw: &str) -> Result<Value, ConvertError> {
    Ok(Value::Text(raw.to_string()))
}

impl Converter for TextConverter {
    fn name(&self) -> &str {
        "text"
    }

    fn supports(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Text
    }

    /// Always text, whatever the field's declared type: a text override on a numeric field
    /// makes its values match textually.
    fn parse(&self, _field_type: FieldType, raw: &str) -> Result<Value, ConvertError> {
        scalar_parser(FieldType::Text)(raw)
    }

    fn equals(&self, field: Option<&Field>, expected: &Value, actual: &Value) -> Result<bool, ConvertError> {
        Ok(representation(field, expected) == representation(field, actual))
    }
}
