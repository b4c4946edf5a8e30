use std::sync::{Arc, PoisonError, RwLock};

use super::{BooleanConverter, Converter, DateConverter, NumberConverter, TextConverter};
use crate::plan::Field;
use crate::value::FieldType;

/// Ordered set of converters. The most recently registered converter is searched first.
///
/// Shared between parses and evaluations; registration takes the write lock.
#[derive(Debug, Default)]
pub struct ConverterRegistry {
    converters: RwLock<Vec<Arc<dyn Converter>>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `text`, `number`, `date` and `boolean` converters.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(TextConverter));
        registry.register(Arc::new(NumberConverter));
        registry.register(Arc::new(DateConverter));
        registry.register(Arc::new(BooleanConverter));
        registry
    }

    /// Insert at the highest priority.
    pub fn register(&self, converter: Arc<dyn Converter>) {
        tracing::debug!("Registering converter '{}'", converter.name());
        self.converters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, converter);
    }

    /// Remove this exact converter instance. Returns whether it was registered.
    pub fn unregister(&self, converter: &Arc<dyn Converter>) -> bool {
        let mut converters = self
            .converters
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = converters.len();
        converters.retain(|registered| !Arc::ptr_eq(registered, converter));
        before != converters.len()
    }

    /// Remove every converter registered under `name`.
    pub fn unregister_named(&self, name: &str) -> bool {
        let mut converters = self
            .converters
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = converters.len();
        converters.retain(|registered| registered.name() != name);
        before != converters.len()
    }

    /// First converter, by priority, supporting the type.
    pub fn find(&self, field_type: FieldType) -> Option<Arc<dyn Converter>> {
        self.converters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|converter| converter.supports(field_type))
            .cloned()
    }

    /// Highest-priority converter registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Converter>> {
        self.converters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|converter| converter.name() == name)
            .cloned()
    }

    /// Converter names by priority.
    pub fn names(&self) -> Vec<String> {
        self.converters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|converter| converter.name().to_string())
            .collect()
    }

    /// Uses the field's type, or `default_type` when there is no field.
    ///
    /// Without a `default_type` this finds nothing even when the field has a type of its own.
    /// The parser always passes one; see [`ConverterRegistry::find_for_field_type`] for the
    /// field-first reading.
    pub fn find_for_field(
        &self,
        field: Option<&Field>,
        default_type: Option<FieldType>,
    ) -> Option<Arc<dyn Converter>> {
        let field_type = field.map(Field::field_type).or(default_type)?;
        default_type.and_then(|_| self.find(field_type))
    }

    /// The field's own type first, `default_type` only when there is no field.
    pub fn find_for_field_type(
        &self,
        field: Option<&Field>,
        default_type: Option<FieldType>,
    ) -> Option<Arc<dyn Converter>> {
        let field_type = field.map(Field::field_type).or(default_type)?;
        self.find(field_type)
    }
}
