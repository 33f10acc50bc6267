//! Modules bundle processor and evaluator classes for registration.

use crate::core::error::RegistryError;
use crate::core::processor::PassthroughProcessor;
use crate::link::evaluators;
use crate::processors;
use crate::registry::Registry;

/// A named set of classes registered together.
pub trait Module {
    fn name(&self) -> &'static str;

    /// Register this module's classes.
    fn register(&self, registry: &mut Registry) -> Result<(), RegistryError>;
}

/// Built-in link evaluators and utility processors.
pub struct CoreModule;

impl Module for CoreModule {
    fn name(&self) -> &'static str {
        "core"
    }

    fn register(&self, registry: &mut Registry) -> Result<(), RegistryError> {
        for prototype in evaluators::builtin() {
            registry.evaluators_mut().register(prototype)?;
        }
        registry
            .processors_mut()
            .register(Box::new(PassthroughProcessor))
    }
}

/// Image sources, filters and canvases.
pub struct BaseModule;

impl Module for BaseModule {
    fn name(&self) -> &'static str {
        "base"
    }

    fn register(&self, registry: &mut Registry) -> Result<(), RegistryError> {
        for prototype in processors::builtin() {
            registry.processors_mut().register(prototype)?;
        }
        Ok(())
    }
}

/// Look up a built-in module by name.
pub fn builtin_module(name: &str) -> Option<Box<dyn Module>> {
    match name {
        "core" => Some(Box::new(CoreModule)),
        "base" => Some(Box::new(BaseModule)),
        _ => None,
    }
}

/// Names of all built-in modules in load order.
pub const BUILTIN_MODULES: &[&str] = &["core", "base"];
