//! Link evaluator factory.

use crate::core::error::{LinkError, RegistryError};
use crate::core::property::Property;
use crate::link::evaluator::LinkEvaluator;
use indexmap::IndexMap;

/// Evaluator prototypes keyed by class name.
#[derive(Default)]
pub struct LinkEvaluatorFactory {
    prototypes: IndexMap<String, Box<dyn LinkEvaluator>>,
}

impl LinkEvaluatorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an evaluator class. Fails if the class name is taken.
    pub fn register(&mut self, prototype: Box<dyn LinkEvaluator>) -> Result<(), RegistryError> {
        let class = prototype.class_name().to_string();
        if self.prototypes.contains_key(&class) {
            return Err(RegistryError::DuplicateClass(class));
        }
        log::debug!("Registered link evaluator '{}'", class);
        self.prototypes.insert(class, prototype);
        Ok(())
    }

    /// Create an evaluator with default parameters.
    pub fn create(&self, class: &str) -> Result<Box<dyn LinkEvaluator>, RegistryError> {
        self.prototypes
            .get(class)
            .map(|p| p.create())
            .ok_or_else(|| RegistryError::UnknownClass(class.to_string()))
    }

    /// Create an evaluator and restore persisted parameters.
    pub fn create_configured(
        &self,
        class: &str,
        parameters: &serde_json::Value,
    ) -> Result<Result<Box<dyn LinkEvaluator>, LinkError>, RegistryError> {
        let mut evaluator = self.create(class)?;
        Ok(evaluator.configure(parameters).map(|_| evaluator))
    }

    pub fn contains(&self, class: &str) -> bool {
        self.prototypes.contains_key(class)
    }

    /// Display name of a class.
    pub fn display_name(&self, class: &str) -> Option<&'static str> {
        self.prototypes.get(class).map(|p| p.display_name())
    }

    pub fn known_classes(&self) -> Vec<&str> {
        self.prototypes.keys().map(String::as_str).collect()
    }

    /// Classes able to link `source` to `destination`.
    pub fn compatible(&self, source: &Property, destination: &Property) -> Vec<&str> {
        self.prototypes
            .iter()
            .filter(|(_, p)| p.are_linkable(source, destination))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Preferred evaluator for a pair: `id` when it applies, otherwise the
    /// first compatible class.
    pub fn default_for(&self, source: &Property, destination: &Property) -> Option<&str> {
        let compatible = self.compatible(source, destination);
        compatible
            .iter()
            .find(|name| **name == "id")
            .or_else(|| compatible.first())
            .copied()
    }

    pub fn unregister(&mut self, class: &str) -> bool {
        self.prototypes.shift_remove(class).is_some()
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// Move every class of `other` into this factory.
    pub(crate) fn absorb(&mut self, other: LinkEvaluatorFactory) -> Result<(), RegistryError> {
        for (_, prototype) in other.prototypes {
            self.register(prototype)?;
        }
        Ok(())
    }
}
