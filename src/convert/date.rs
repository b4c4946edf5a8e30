use std::cmp::Ordering;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use super::{ConvertError, Converter, Ordered, parse_supported};
use crate::plan::Field;
use crate::value::{FieldType, Value};

/// Calendar dates. Expressions write them `YYYY/MM/DD` or `YYYY.MM.DD` since `-` separates
/// interval bounds; record values may also be ISO dates or RFC 3339 timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateConverter;

pub(super) fn parse_date(raw: &str) -> Result<Value, ConvertError> {
    let raw = raw.trim();
    Date::parse(raw, format_description!("[year]/[month]/[day]"))
        .or_else(|_| Date::parse(raw, format_description!("[year].[month].[day]")))
        .or_else(|_| Date::parse(raw, format_description!("[year]-[month]-[day]")))
        .or_else(|_| OffsetDateTime::parse(raw, &Rfc3339).map(|dt| dt.date()))
        .map(Value::Date)
        .map_err(|err| ConvertError::Invalid(format!("'{}' is not a date: {}", raw, err)))
}

fn date_of(value: &Value) -> Result<Date, ConvertError> {
    match value {
        Value::Date(date) => Ok(*date),
        Value::Text(text) => match parse_date(text)? {
            Value::Date(date) => Ok(date),
            other => Err(ConvertError::Invalid(format!("'{}' is not a date", other))),
        },
        other => Err(ConvertError::Invalid(format!(
            "{} value '{}' is not a date",
            other.field_type(),
            other
        ))),
    }
}

impl Converter for DateConverter {
    fn name(&self) -> &str {
        "date"
    }

    fn supports(&self, field_type: FieldType) -> bool {
        field_type == FieldType::Date
    }

    fn parse(&self, field_type: FieldType, raw: &str) -> Result<Value, ConvertError> {
        parse_supported(self, field_type, raw)
    }

    fn ordering(&self) -> Option<&dyn Ordered> {
        Some(self)
    }

    fn equals(&self, _field: Option<&Field>, expected: &Value, actual: &Value) -> Result<bool, ConvertError> {
        Ok(date_of(expected)? == date_of(actual)?)
    }
}

impl Ordered for DateConverter {
    fn compare(&self, left: &Value, right: &Value) -> Result<Ordering, ConvertError> {
        Ok(date_of(left)?.cmp(&date_of(right)?))
    }
}
