//! Processor instances inside a network.

use crate::core::context::ProcessContext;
use crate::core::error::{ProcessError, ProcessResult, ProcessorId};
use crate::core::port::{Payload, Port, PortDefinition, PortKind};
use crate::core::processor::{InvalidationLevel, LifecycleState, Processor};
use crate::core::property::Property;
use crate::core::types::Value;
use indexmap::IndexMap;

/// A processor together with its properties, ports and lifecycle state.
pub struct ProcessorNode {
    id: ProcessorId,
    name: String,
    class_name: String,
    processor: Box<dyn Processor>,
    properties: IndexMap<String, Property>,
    ports: IndexMap<String, Port>,
    state: LifecycleState,
    /// `initialize()` succeeded and `deinitialize()` has not run since.
    resources_held: bool,
    invalidation: InvalidationLevel,
    end_processor: bool,
}

impl std::fmt::Debug for ProcessorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("class_name", &self.class_name)
            .field("properties", &self.properties)
            .field("state", &self.state)
            .field("resources_held", &self.resources_held)
            .field("invalidation", &self.invalidation)
            .finish()
    }
}

impl ProcessorNode {
    /// Instantiate ports and properties from the processor's metadata.
    pub fn new(id: ProcessorId, name: impl Into<String>, processor: Box<dyn Processor>) -> Self {
        let metadata = processor.metadata();
        let properties = metadata
            .properties
            .iter()
            .map(|prototype| {
                let mut property = prototype.clone();
                property.set_owner(id);
                (property.id().to_string(), property)
            })
            .collect();
        let ports = metadata
            .inports
            .iter()
            .chain(metadata.outports.iter())
            .map(|definition| (definition.name.clone(), Port::new(definition.clone())))
            .collect();

        Self {
            id,
            name: name.into(),
            class_name: metadata.class_name,
            processor,
            properties,
            ports,
            state: LifecycleState::Uninitialized,
            resources_held: false,
            invalidation: InvalidationLevel::InvalidPorts,
            end_processor: metadata.end_processor,
        }
    }

    pub fn id(&self) -> ProcessorId {
        self.id
    }

    /// Instance name, unique within the network.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn processor(&self) -> &dyn Processor {
        self.processor.as_ref()
    }

    // ========================================================================
    // Properties and ports
    // ========================================================================

    pub fn properties(&self) -> &IndexMap<String, Property> {
        &self.properties
    }

    pub fn property(&self, id: &str) -> Option<&Property> {
        self.properties.get(id)
    }

    pub(crate) fn property_mut(&mut self, id: &str) -> Option<&mut Property> {
        self.properties.get_mut(id)
    }

    pub fn ports(&self) -> &IndexMap<String, Port> {
        &self.ports
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.get(name)
    }

    pub fn inports(&self) -> impl Iterator<Item = &PortDefinition> {
        self.ports
            .values()
            .map(|p| &p.definition)
            .filter(|d| d.is_inport())
    }

    pub fn outports(&self) -> impl Iterator<Item = &PortDefinition> {
        self.ports
            .values()
            .map(|p| &p.definition)
            .filter(|d| d.is_outport())
    }

    /// Current payload of an outport.
    pub fn output(&self, port: &str) -> Option<&Payload> {
        self.ports.get(port).and_then(|p| p.data.as_ref())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == LifecycleState::Initialized
    }

    pub fn invalidation(&self) -> InvalidationLevel {
        self.invalidation
    }

    pub fn is_end_processor(&self) -> bool {
        self.end_processor
    }

    /// Raise the invalidation level. Never lowers it.
    pub fn invalidate(&mut self, level: InvalidationLevel) {
        self.invalidation = self.invalidation.max(level);
    }

    pub(crate) fn set_valid(&mut self) {
        self.invalidation = InvalidationLevel::Valid;
    }

    /// Whether the processor holds resources from a successful
    /// `initialize()`. Stays true after a runtime failure.
    pub fn holds_resources(&self) -> bool {
        self.resources_held
    }

    /// Initialize the processor if it is not already initialized.
    ///
    /// Resources left over from an earlier run are released before a
    /// retry. On failure the processor is deinitialized best-effort and left
    /// in the Failed state.
    pub fn initialize(&mut self) -> ProcessResult<()> {
        if self.is_initialized() {
            return Ok(());
        }
        self.release();
        match self.processor.initialize(&self.properties) {
            Ok(()) => {
                self.state = LifecycleState::Initialized;
                self.resources_held = true;
                self.invalidate(InvalidationLevel::InvalidResult);
                Ok(())
            }
            Err(e) => {
                self.processor.deinitialize();
                self.state = LifecycleState::Failed;
                Err(e)
            }
        }
    }

    /// Release resources and drop outport data.
    pub fn deinitialize(&mut self) {
        self.release();
        self.state = LifecycleState::Uninitialized;
        self.clear_outputs();
    }

    fn release(&mut self) {
        if self.resources_held {
            self.processor.deinitialize();
            self.resources_held = false;
        }
    }

    /// Drop the data of every port.
    pub(crate) fn clear_outputs(&mut self) {
        for port in self.ports.values_mut() {
            port.clear();
        }
    }

    pub(crate) fn mark_failed(&mut self) {
        self.state = LifecycleState::Failed;
    }

    /// Run `process()` with the gathered inputs. Returns the property
    /// writes the processor requested.
    pub(crate) fn run(
        &mut self,
        inputs: IndexMap<String, Vec<Payload>>,
    ) -> ProcessResult<Vec<(String, Value)>> {
        if !self.is_initialized() {
            return Err(ProcessError::NotInitialized);
        }
        let mut ctx = ProcessContext::new(&self.name, &self.properties, inputs, &mut self.ports);
        self.processor.process(&mut ctx)?;
        Ok(ctx.into_requests())
    }

    /// Republish the callables of all coprocessor outports.
    pub(crate) fn refresh_coprocessors(&mut self) {
        for port in self.ports.values_mut() {
            let definition = &port.definition;
            if definition.kind != PortKind::Coprocessor || !definition.is_outport() {
                continue;
            }
            port.data = self
                .processor
                .coprocessor(&definition.name, &self.properties)
                .map(Payload::Coprocessor);
        }
    }

    /// Required inports in declaration order.
    pub fn required_inports(&self) -> Vec<&str> {
        self.inports()
            .filter(|d| !d.optional)
            .map(|d| d.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{Blur, ColorMap};

    #[test]
    fn test_node_from_metadata() {
        let id = ProcessorId::new();
        let node = ProcessorNode::new(id, "Blur", Box::new(Blur));

        assert_eq!(node.class_name(), "Blur");
        assert_eq!(node.property("sigma").and_then(|p| p.owner()), Some(id));
        assert_eq!(node.inports().count(), 1);
        assert_eq!(node.outports().count(), 1);
        assert_eq!(node.required_inports(), vec!["image.input"]);
        assert_eq!(node.state(), LifecycleState::Uninitialized);
        assert_eq!(node.invalidation(), InvalidationLevel::InvalidPorts);
    }

    #[test]
    fn test_run_requires_initialization() {
        let mut node = ProcessorNode::new(ProcessorId::new(), "Blur", Box::new(Blur));
        assert_eq!(node.run(IndexMap::new()), Err(ProcessError::NotInitialized));

        node.initialize().unwrap();
        assert!(node.is_initialized());
        node.deinitialize();
        assert_eq!(node.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn test_refresh_coprocessors() {
        let mut node = ProcessorNode::new(ProcessorId::new(), "ColorMap", Box::new(ColorMap));
        assert!(node.output("cp.colormap").is_none());
        node.refresh_coprocessors();
        assert!(node
            .output("cp.colormap")
            .and_then(|p| p.as_coprocessor())
            .is_some());
    }

    #[test]
    fn test_invalidate_never_lowers() {
        let mut node = ProcessorNode::new(ProcessorId::new(), "Blur", Box::new(Blur));
        node.set_valid();
        node.invalidate(InvalidationLevel::InvalidResult);
        node.invalidate(InvalidationLevel::Valid);
        assert_eq!(node.invalidation(), InvalidationLevel::InvalidResult);
    }
}
