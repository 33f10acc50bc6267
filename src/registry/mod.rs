//! Registries for processor and link evaluator classes.
//!
//! A [`Registry`] is created at startup, filled from modules and passed by
//! reference to everything that instantiates classes by name. Dropping it
//! is the shutdown step.

pub mod evaluators;
pub mod module;
pub mod processors;

pub use evaluators::LinkEvaluatorFactory;
pub use module::{builtin_module, BaseModule, CoreModule, Module, BUILTIN_MODULES};
pub use processors::ProcessorFactory;

use crate::core::error::RegistryError;

/// Processor and evaluator factories plus the names of loaded modules.
#[derive(Default)]
pub struct Registry {
    processors: ProcessorFactory,
    evaluators: LinkEvaluatorFactory,
    modules: Vec<String>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in modules loaded.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for module in [&CoreModule as &dyn Module, &BaseModule] {
            if let Err(e) = registry.register_module(module) {
                log::error!("Failed to load built-in module '{}': {}", module.name(), e);
            }
        }
        registry
    }

    /// Create a registry from built-in module names.
    pub fn from_modules<S: AsRef<str>>(names: &[S]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for name in names {
            let module = builtin_module(name.as_ref())
                .ok_or_else(|| RegistryError::UnknownModule(name.as_ref().to_string()))?;
            registry.register_module(module.as_ref())?;
        }
        Ok(registry)
    }

    /// Load a module. Loading the same module twice is a no-op.
    ///
    /// The module registers into an empty registry first. Its classes are
    /// merged only if none of them is taken, so a failed load leaves this
    /// registry unchanged.
    pub fn register_module(&mut self, module: &dyn Module) -> Result<(), RegistryError> {
        let name = module.name();
        if self.modules.iter().any(|m| m == name) {
            log::warn!("Module '{}' is already loaded", name);
            return Ok(());
        }
        let mut staged = Registry::new();
        module.register(&mut staged)?;

        let taken = staged
            .processors
            .known_classes()
            .into_iter()
            .find(|class| self.processors.contains(class))
            .or_else(|| {
                staged
                    .evaluators
                    .known_classes()
                    .into_iter()
                    .find(|class| self.evaluators.contains(class))
            })
            .map(str::to_string);
        if let Some(class) = taken {
            return Err(RegistryError::DuplicateClass(class));
        }

        self.processors.absorb(staged.processors)?;
        self.evaluators.absorb(staged.evaluators)?;
        self.modules.push(name.to_string());
        log::info!(
            "Loaded module '{}' ({} processors, {} evaluators total)",
            name,
            self.processors.len(),
            self.evaluators.len()
        );
        Ok(())
    }

    pub fn processors(&self) -> &ProcessorFactory {
        &self.processors
    }

    pub fn processors_mut(&mut self) -> &mut ProcessorFactory {
        &mut self.processors
    }

    pub fn evaluators(&self) -> &LinkEvaluatorFactory {
        &self.evaluators
    }

    pub fn evaluators_mut(&mut self) -> &mut LinkEvaluatorFactory {
        &mut self.evaluators
    }

    /// Names of loaded modules in load order.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_builtins() {
        let registry = Registry::with_builtins();
        assert_eq!(registry.modules(), &["core", "base"]);
        assert!(registry.processors().contains("Passthrough"));
        assert!(registry.processors().contains("Blur"));
        assert!(registry.evaluators().contains("id"));
    }

    #[test]
    fn test_from_modules() {
        let registry = Registry::from_modules(&["core"]).unwrap();
        assert!(registry.evaluators().contains("affine"));
        assert!(!registry.processors().contains("Blur"));

        let err = Registry::from_modules(&["core", "opencl"]).err();
        assert_eq!(err, Some(RegistryError::UnknownModule("opencl".into())));
    }

    #[test]
    fn test_module_loaded_once() {
        let mut registry = Registry::new();
        registry.register_module(&CoreModule).unwrap();
        let count = registry.evaluators().len();
        registry.register_module(&CoreModule).unwrap();
        assert_eq!(registry.evaluators().len(), count);
        assert_eq!(registry.modules().len(), 1);
    }

    #[test]
    fn test_clashing_module_is_not_applied() {
        let mut registry = Registry::new();
        registry.processors_mut().register(Box::new(crate::processors::Blur)).unwrap();

        let err = registry.register_module(&BaseModule).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateClass("Blur".into()));
        assert_eq!(registry.processors().known_classes(), vec!["Blur"]);
        assert!(registry.modules().is_empty());

        registry.register_module(&CoreModule).unwrap();
        assert!(registry.processors().contains("Passthrough"));
        assert_eq!(registry.modules(), &["core"]);
    }
}
