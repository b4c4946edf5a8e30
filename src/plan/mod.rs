//! The search plan: fields allowed in expressions, the operator resolver and the converters.

mod field;

pub use field::Field;

use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{FieldConfig, PlanConfig};
use crate::convert::{Converter, ConverterRegistry};
use crate::dsl::OperatorResolver;
use crate::error::{ALL_FIELDS, SearchError};
use crate::value::FieldType;

/// Built once at startup, read-only while parsing and evaluating.
#[derive(Debug)]
pub struct Plan {
    resolver: OperatorResolver,
    registry: Arc<ConverterRegistry>,
    fields: HashMap<String, Arc<Field>>,
}

impl Plan {
    pub fn new(resolver: OperatorResolver, registry: Arc<ConverterRegistry>) -> Self {
        Self {
            resolver,
            registry,
            fields: HashMap::new(),
        }
    }

    /// Default separators and the built-in converters.
    pub fn with_defaults() -> Self {
        Self::new(
            OperatorResolver::default(),
            Arc::new(ConverterRegistry::with_defaults()),
        )
    }

    /// Adds a field; a field with the same name is replaced.
    pub fn add_field(&mut self, field: Field) -> Arc<Field> {
        let field = Arc::new(field);
        self.fields
            .insert(field.name().to_string(), Arc::clone(&field));
        field
    }

    pub fn field(&self, name: &str) -> Option<&Arc<Field>> {
        self.fields.get(name)
    }

    /// All fields, sorted by name.
    pub fn fields(&self) -> Vec<&Arc<Field>> {
        let mut fields: Vec<_> = self.fields.values().collect();
        fields.sort_by(|a, b| a.name().cmp(b.name()));
        fields
    }

    pub fn resolver(&self) -> &OperatorResolver {
        &self.resolver
    }

    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    /// The converter for a leaf: the field override first, then the registry by the field's
    /// type, with text as the type of all-fields leaves.
    pub fn converter_for(&self, field: Option<&Field>, raw: &str) -> Result<Arc<dyn Converter>, SearchError> {
        if let Some(converter) = field.and_then(Field::converter) {
            return Ok(Arc::clone(converter));
        }

        self.registry
            .find_for_field(field, Some(FieldType::Text))
            .ok_or_else(|| SearchError::Lookup {
                field: field.map_or(ALL_FIELDS, Field::name).to_string(),
                field_type: field.map_or(FieldType::Text, Field::field_type),
                raw: raw.to_string(),
            })
    }

    pub fn from_config(config: &PlanConfig, registry: Arc<ConverterRegistry>) -> Result<Self> {
        let list_separator = single_char("list_separator", &config.list_separator)?;
        let interval_separator = single_char("interval_separator", &config.interval_separator)?;
        if list_separator == interval_separator {
            bail!("Plan: list and interval separators must differ (both '{}')", list_separator);
        }

        let mut plan = Plan::new(
            OperatorResolver::new(list_separator, interval_separator),
            registry,
        );

        for field_config in &config.fields {
            let field = plan
                .build_field(field_config)
                .with_context(|| format!("Plan: invalid field '{}'", field_config.name))?;
            if plan.field(field.name()).is_some() {
                tracing::warn!("Plan: field '{}' declared twice, keeping the last one", field.name());
            }
            plan.add_field(field);
        }

        tracing::debug!("Plan: {} fields loaded", plan.fields.len());
        Ok(plan)
    }

    fn build_field(&self, config: &FieldConfig) -> Result<Field> {
        if config.name.trim().is_empty() {
            bail!("field name is empty");
        }

        let mut field = Field::new(config.name.clone(), config.field_type)
            .case_sensitive(config.case_sensitive);
        if let Some(operator) = config.default_operator {
            field = field.with_default_operator(operator);
        }
        if let Some(name) = &config.converter {
            let converter = self.registry.get(name).ok_or_else(|| SearchError::Lookup {
                field: config.name.clone(),
                field_type: config.field_type,
                raw: name.clone(),
            })?;
            field = field.with_converter(converter);
        }
        Ok(field)
    }

    /// Inverse of [`Plan::from_config`].
    pub fn to_config(&self) -> PlanConfig {
        PlanConfig {
            list_separator: self.resolver.list_separator().to_string(),
            interval_separator: self.resolver.interval_separator().to_string(),
            fields: self
                .fields()
                .into_iter()
                .map(|field| FieldConfig {
                    name: field.name().to_string(),
                    field_type: field.field_type(),
                    default_operator: field.default_operator(),
                    case_sensitive: field.is_case_sensitive(),
                    converter: field.converter().map(|c| c.name().to_string()),
                })
                .collect(),
        }
    }
}

fn single_char(key: &str, value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != ' ' => Ok(c),
        _ => bail!("Plan: {} must be a single non-space character, got '{}'", key, value),
    }
}
