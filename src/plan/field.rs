use std::fmt;
use std::sync::Arc;

use crate::convert::Converter;
use crate::dsl::RelationalOperator;
use crate::value::FieldType;

/// A named, typed attribute that expressions may search on.
#[derive(Clone)]
pub struct Field {
    name: String,
    field_type: FieldType,
    converter: Option<Arc<dyn Converter>>,
    default_operator: Option<RelationalOperator>,
    case_sensitive: bool,
}

impl Field {
    /// Case-insensitive, no default operator, converter taken from the registry.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            converter: None,
            default_operator: None,
            case_sensitive: false,
        }
    }

    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn with_default_operator(mut self, operator: RelationalOperator) -> Self {
        self.default_operator = Some(operator);
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Field-level override, consulted before the registry.
    pub fn converter(&self) -> Option<&Arc<dyn Converter>> {
        self.converter.as_ref()
    }

    pub fn default_operator(&self) -> Option<RelationalOperator> {
        self.default_operator
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("converter", &self.converter.as_ref().map(|c| c.name()))
            .field("default_operator", &self.default_operator)
            .field("case_sensitive", &self.case_sensitive)
            .finish()
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.field_type == other.field_type
            && self.default_operator == other.default_operator
            && self.case_sensitive == other.case_sensitive
            && self.converter.as_ref().map(|c| c.name()) == other.converter.as_ref().map(|c| c.name())
    }
}
