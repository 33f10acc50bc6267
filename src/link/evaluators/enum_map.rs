//! Key mapping between string and option properties.

use crate::core::error::LinkError;
use crate::core::property::Property;
use crate::core::types::{Value, ValueKind};
use crate::link::evaluator::{decode_parameters, incompatible, LinkEvaluator, LinkInput};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EnumMapParameters {
    #[serde(default)]
    mapping: IndexMap<String, String>,
}

/// Translates keys through a table.
///
/// The source key is looked up in the mapping first, then used directly.
/// When neither candidate is accepted by the destination the old target
/// is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumMapEvaluator {
    mapping: IndexMap<String, String>,
}

impl EnumMapEvaluator {
    pub fn new(mapping: IndexMap<String, String>) -> Self {
        Self { mapping }
    }

    /// Add one mapping entry.
    pub fn map(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.mapping.insert(from.into(), to.into());
        self
    }

    pub fn mapping(&self) -> &IndexMap<String, String> {
        &self.mapping
    }
}

fn is_keyed(kind: ValueKind) -> bool {
    matches!(kind, ValueKind::String | ValueKind::Option)
}

impl LinkEvaluator for EnumMapEvaluator {
    fn class_name(&self) -> &'static str {
        "enum_map"
    }

    fn display_name(&self) -> &'static str {
        "Enum Mapping"
    }

    fn are_linkable(&self, source: &Property, destination: &Property) -> bool {
        is_keyed(source.kind()) && is_keyed(destination.kind())
    }

    fn eval(&self, input: &LinkInput) -> Result<Value, LinkError> {
        if !self.are_linkable(input.source, input.destination) {
            return Err(incompatible(self, input));
        }
        let key = input.source.get().as_str().unwrap_or_default();
        let mapped = self.mapping.get(key).map(String::as_str);
        let wrap = |k: &str| match input.destination.kind() {
            ValueKind::Option => Value::Option(k.to_string()),
            _ => Value::String(k.to_string()),
        };

        let accepted = mapped
            .into_iter()
            .chain(std::iter::once(key))
            .map(wrap)
            .find_map(|candidate| input.destination.validate(candidate).ok());
        Ok(accepted.unwrap_or_else(|| input.destination.get().clone()))
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({ "mapping": self.mapping })
    }

    fn configure(&mut self, parameters: &serde_json::Value) -> Result<(), LinkError> {
        if parameters.is_null() {
            return Ok(());
        }
        let decoded: EnumMapParameters = decode_parameters(self.class_name(), parameters)?;
        self.mapping = decoded.mapping;
        Ok(())
    }

    fn create(&self) -> Box<dyn LinkEvaluator> {
        Box::new(EnumMapEvaluator::default())
    }

    fn clone_box(&self) -> Box<dyn LinkEvaluator> {
        Box::new(self.clone())
    }
}
