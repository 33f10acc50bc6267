//! Directed links between two properties.

use crate::core::error::{LinkId, ProcessorId};
use crate::link::evaluator::LinkEvaluator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a property inside a network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyKey {
    pub processor: ProcessorId,
    pub property: String,
}

impl PropertyKey {
    pub fn new(processor: ProcessorId, property: impl Into<String>) -> Self {
        Self {
            processor,
            property: property.into(),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.processor, self.property)
    }
}

/// A link from a source property to a destination property.
///
/// The link owns its evaluator. Inactive links are skipped by propagation.
pub struct PropertyLink {
    id: LinkId,
    source: PropertyKey,
    destination: PropertyKey,
    evaluator: Box<dyn LinkEvaluator>,
    active: bool,
}

impl PropertyLink {
    /// Create an active link.
    pub fn new(source: PropertyKey, destination: PropertyKey, evaluator: Box<dyn LinkEvaluator>) -> Self {
        Self {
            id: LinkId::new(),
            source,
            destination,
            evaluator,
            active: true,
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn source(&self) -> &PropertyKey {
        &self.source
    }

    pub fn destination(&self) -> &PropertyKey {
        &self.destination
    }

    pub fn evaluator(&self) -> &dyn LinkEvaluator {
        self.evaluator.as_ref()
    }

    pub fn evaluator_mut(&mut self) -> &mut dyn LinkEvaluator {
        self.evaluator.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether either endpoint belongs to `processor`.
    pub fn involves(&self, processor: ProcessorId) -> bool {
        self.source.processor == processor || self.destination.processor == processor
    }

    /// Same endpoints in the same direction.
    pub fn connects(&self, source: &PropertyKey, destination: &PropertyKey) -> bool {
        &self.source == source && &self.destination == destination
    }
}

impl fmt::Debug for PropertyLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyLink")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("evaluator", &self.evaluator.class_name())
            .field("active", &self.active)
            .finish()
    }
}
