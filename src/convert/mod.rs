//! Converters turn raw expression text into typed operands and decide how record values match.
//!
//! A converter only has to parse scalars and declare which types it supports. EQUALS, LIKE and
//! LIST matching come from the shared helpers below; INTERVAL needs the extra [`Ordered`]
//! capability, which only types with a natural ordering provide.

mod boolean;
mod date;
mod number;
mod registry;
mod text;

pub use boolean::BooleanConverter;
pub use date::DateConverter;
pub use number::NumberConverter;
pub use registry::ConverterRegistry;
pub use text::TextConverter;

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

use crate::dsl::{OperatorResolver, RelationalOperator};
use crate::error::{ALL_FIELDS, SearchError};
use crate::plan::Field;
use crate::value::{FieldType, Operand, Value};

/// Failure reported by a converter, lifted into [`SearchError`] by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("{0}")]
    Invalid(String),
    #[error("type has no natural ordering")]
    Unordered,
    #[error("operator not supported")]
    Unsupported,
}

impl ConvertError {
    pub fn into_search_error(
        self,
        field: &str,
        raw: &str,
        operator: RelationalOperator,
        converter: &str,
    ) -> SearchError {
        match self {
            ConvertError::Invalid(reason) => SearchError::Conversion {
                field: field.to_string(),
                raw: raw.to_string(),
                operator,
                reason,
            },
            ConvertError::Unordered => SearchError::Configuration {
                field: field.to_string(),
                raw: raw.to_string(),
                operator,
                reason: format!("the {} converter has no natural ordering", converter),
            },
            ConvertError::Unsupported => SearchError::OperatorUnsupported {
                field: field.to_string(),
                raw: raw.to_string(),
                operator,
                converter: converter.to_string(),
            },
        }
    }
}

/// Capability contract of a converter.
pub trait Converter: Send + Sync + fmt::Debug {
    /// Registry key, also used by plan configuration overrides.
    fn name(&self) -> &str;

    fn supports(&self, field_type: FieldType) -> bool;

    /// Parse one scalar for a field of the given type.
    fn parse(&self, field_type: FieldType, raw: &str) -> Result<Value, ConvertError>;

    /// INTERVAL capability; `None` for types without a natural ordering.
    fn ordering(&self) -> Option<&dyn Ordered> {
        None
    }

    /// EQUALS on single values. Structural equality unless the type needs coercion.
    fn equals(&self, _field: Option<&Field>, expected: &Value, actual: &Value) -> Result<bool, ConvertError> {
        Ok(expected == actual)
    }

    fn matches(
        &self,
        field: Option<&Field>,
        operator: RelationalOperator,
        expected: &Operand,
        actual: &Value,
    ) -> Result<bool, ConvertError> {
        match_operand(self, field, operator, expected, actual)
    }
}

/// Natural ordering used by INTERVAL matching.
pub trait Ordered: Send + Sync {
    fn compare(&self, left: &Value, right: &Value) -> Result<Ordering, ConvertError>;
}

pub type ScalarParser = fn(&str) -> Result<Value, ConvertError>;

/// Parsing function for each semantic type.
pub fn scalar_parser(field_type: FieldType) -> ScalarParser {
    match field_type {
        FieldType::Text => text::parse_text,
        FieldType::Integer => number::parse_integer,
        FieldType::Float => number::parse_float,
        FieldType::Date => date::parse_date,
        FieldType::Boolean => boolean::parse_boolean,
    }
}

/// Parse through the type's table entry when the converter supports that type.
pub fn parse_supported<C: Converter + ?Sized>(
    converter: &C,
    field_type: FieldType,
    raw: &str,
) -> Result<Value, ConvertError> {
    if !converter.supports(field_type) {
        return Err(ConvertError::Invalid(format!(
            "the {} converter cannot read {} values",
            converter.name(),
            field_type
        )));
    }
    scalar_parser(field_type)(raw)
}

/// Textual form, lower-cased unless the field is case-sensitive. All-fields leaves fold case.
pub fn representation(field: Option<&Field>, value: &Value) -> String {
    if field.is_some_and(Field::is_case_sensitive) {
        value.to_string()
    } else {
        value.to_string().to_lowercase()
    }
}

pub fn match_like(field: Option<&Field>, expected: &Value, actual: &Value) -> bool {
    representation(field, actual).contains(&representation(field, expected))
}

/// The actual value must contain one of the expected elements.
pub fn match_list(field: Option<&Field>, expected: &[Value], actual: &Value) -> bool {
    let actual = representation(field, actual);
    expected
        .iter()
        .any(|item| actual.contains(&representation(field, item)))
}

/// Inclusive on both ends; bounds are not reordered.
pub fn match_interval(
    ordering: &dyn Ordered,
    low: &Value,
    high: &Value,
    actual: &Value,
) -> Result<bool, ConvertError> {
    Ok(ordering.compare(low, actual)? != Ordering::Greater
        && ordering.compare(actual, high)? != Ordering::Greater)
}

/// Dispatch shared by every converter's default [`Converter::matches`].
pub fn match_operand<C: Converter + ?Sized>(
    converter: &C,
    field: Option<&Field>,
    operator: RelationalOperator,
    expected: &Operand,
    actual: &Value,
) -> Result<bool, ConvertError> {
    match (operator, expected) {
        (RelationalOperator::Equals, Operand::Scalar(value)) => converter.equals(field, value, actual),
        (RelationalOperator::Like, Operand::Scalar(value)) => Ok(match_like(field, value, actual)),
        (RelationalOperator::List, Operand::List(items)) => Ok(match_list(field, items, actual)),
        (RelationalOperator::Interval, Operand::Interval(low, high)) => match converter.ordering() {
            Some(ordering) => match_interval(ordering, low, high, actual),
            None => Err(ConvertError::Unordered),
        },
        _ => Err(ConvertError::Unsupported),
    }
}

/// Outcome of converting one raw value: the leaf's operator, operand and inversion flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub operator: RelationalOperator,
    pub operand: Operand,
    pub inverted: bool,
}

/// Strip a leading `!`, infer the operator, then parse the scalar, list or interval.
pub fn convert(
    converter: &dyn Converter,
    resolver: &OperatorResolver,
    field: Option<&Field>,
    raw: &str,
) -> Result<Conversion, SearchError> {
    let (inverted, value) = match raw.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    if inverted {
        tracing::debug!("Operation inversion detected for '{}'", raw);
    }

    let operator = resolver.resolve(field, value);
    let ctx = Context {
        converter,
        field_type: field.map_or(FieldType::Text, Field::field_type),
        label: field.map_or(ALL_FIELDS, Field::name),
        raw: value,
        operator,
    };

    let operand = match operator {
        RelationalOperator::Like | RelationalOperator::Equals => Operand::Scalar(ctx.parse(value)?),
        RelationalOperator::List => {
            let pieces = split(value, resolver.list_separator());
            if pieces.is_empty() {
                return Err(ctx.configuration("no list element found".to_string()));
            }
            Operand::List(
                pieces
                    .into_iter()
                    .map(|piece| ctx.parse(piece))
                    .collect::<Result<_, _>>()?,
            )
        }
        RelationalOperator::Interval => {
            if converter.ordering().is_none() {
                return Err(ConvertError::Unordered.into_search_error(
                    ctx.label,
                    value,
                    operator,
                    converter.name(),
                ));
            }
            match split(value, resolver.interval_separator()).as_slice() {
                [single] => {
                    let bound = ctx.parse(single)?;
                    Operand::Interval(bound.clone(), bound)
                }
                [low, high] => Operand::Interval(ctx.parse(low)?, ctx.parse(high)?),
                pieces => {
                    return Err(ctx.configuration(format!(
                        "expected one or two interval bounds, found {}",
                        pieces.len()
                    )));
                }
            }
        }
    };

    tracing::trace!("Converted '{}' for {} as {} {:?}", raw, ctx.label, operator, operand);
    Ok(Conversion {
        operator,
        operand,
        inverted,
    })
}

struct Context<'a> {
    converter: &'a dyn Converter,
    field_type: FieldType,
    label: &'a str,
    raw: &'a str,
    operator: RelationalOperator,
}

impl Context<'_> {
    fn parse(&self, piece: &str) -> Result<Value, SearchError> {
        self.converter
            .parse(self.field_type, piece)
            .map_err(|err| {
                err.into_search_error(self.label, self.raw, self.operator, self.converter.name())
            })
    }

    fn configuration(&self, reason: String) -> SearchError {
        SearchError::Configuration {
            field: self.label.to_string(),
            raw: self.raw.to_string(),
            operator: self.operator,
            reason,
        }
    }
}

/// Split on `separator`, dropping trailing empty pieces.
fn split(value: &str, separator: char) -> Vec<&str> {
    let mut pieces: Vec<&str> = value.split(separator).collect();
    while pieces.last().is_some_and(|piece| piece.is_empty()) {
        pieces.pop();
    }
    pieces
}
