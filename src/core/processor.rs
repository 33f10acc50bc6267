//! Processor trait and processor metadata.
//!
//! A processor is a unit of computation with properties and ports. The trait
//! object registered in a factory doubles as the prototype: `create()` builds
//! fresh instances by class name.

use crate::core::context::ProcessContext;
use crate::core::error::ProcessResult;
use crate::core::port::{CoprocessorFn, PortDefinition, PortKind};
use crate::core::property::Property;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Category for grouping processors in palettes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Data sources (image generators, volume readers)
    Source,
    /// Image processing filters
    ImageProcessing,
    /// Volume processing
    Volume,
    /// Color and transfer function handling
    Color,
    /// Canvases and other sinks
    Output,
    /// Utility processors
    #[default]
    Utility,
}

impl Category {
    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Source => "Source",
            Category::ImageProcessing => "Image Processing",
            Category::Volume => "Volume",
            Category::Color => "Color",
            Category::Output => "Output",
            Category::Utility => "Utility",
        }
    }

    /// All categories in display order.
    pub fn all() -> &'static [Category] {
        &[
            Category::Source,
            Category::ImageProcessing,
            Category::Volume,
            Category::Color,
            Category::Output,
            Category::Utility,
        ]
    }
}

/// Metadata describing a processor class.
///
/// Instances get their ports and properties from here when they are added
/// to a network.
#[derive(Debug, Clone)]
pub struct ProcessorMetadata {
    /// Class name used by factories and documents (e.g., "Blur")
    pub class_name: String,
    pub category: Category,
    pub description: String,
    pub inports: Vec<PortDefinition>,
    pub outports: Vec<PortDefinition>,
    /// Property prototypes in display order
    pub properties: Vec<Property>,
    /// Processed in every pass regardless of invalidation (canvases)
    pub end_processor: bool,
    pub tags: Vec<String>,
}

impl ProcessorMetadata {
    /// Create a new metadata builder.
    pub fn builder(class_name: impl Into<String>) -> ProcessorMetadataBuilder {
        ProcessorMetadataBuilder::new(class_name)
    }

    pub fn inport(&self, name: &str) -> Option<&PortDefinition> {
        self.inports.iter().find(|p| p.name == name)
    }

    pub fn outport(&self, name: &str) -> Option<&PortDefinition> {
        self.outports.iter().find(|p| p.name == name)
    }

    pub fn property(&self, id: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.id() == id)
    }

    /// Whether a case-insensitive `query` matches the class name,
    /// description or a tag.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.class_name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

/// Builder for ProcessorMetadata.
pub struct ProcessorMetadataBuilder {
    metadata: ProcessorMetadata,
}

impl ProcessorMetadataBuilder {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            metadata: ProcessorMetadata {
                class_name: class_name.into(),
                category: Category::default(),
                description: String::new(),
                inports: Vec::new(),
                outports: Vec::new(),
                properties: Vec::new(),
                end_processor: false,
                tags: Vec::new(),
            },
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.metadata.category = category;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = description.into();
        self
    }

    /// Add an inport.
    pub fn inport(mut self, port: PortDefinition) -> Self {
        self.metadata.inports.push(port);
        self
    }

    /// Add an outport.
    pub fn outport(mut self, port: PortDefinition) -> Self {
        self.metadata.outports.push(port);
        self
    }

    /// Add a property prototype.
    pub fn property(mut self, property: Property) -> Self {
        self.metadata.properties.push(property);
        self
    }

    /// Mark as an end processor.
    pub fn end_processor(mut self) -> Self {
        self.metadata.end_processor = true;
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.metadata.tags.extend(tags.into_iter().map(|t| t.into()));
        self
    }

    pub fn build(self) -> ProcessorMetadata {
        self.metadata
    }
}

/// Lifecycle of a processor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Failed,
}

/// How much of a processor's state is stale. Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InvalidationLevel {
    Valid,
    /// A property changed; the result must be recomputed
    InvalidResult,
    /// Connections changed
    InvalidPorts,
}

/// The core trait for processors.
///
/// # Lifecycle
///
/// `initialize` runs once before the first `process`, `deinitialize` once
/// before the processor is dropped or removed from its network. The
/// evaluator only calls `process` on initialized processors whose required
/// inports hold data.
///
/// # Example Implementation
///
/// ```ignore
/// #[derive(Debug, Clone, Default)]
/// struct Invert;
///
/// impl Processor for Invert {
///     fn metadata(&self) -> ProcessorMetadata {
///         ProcessorMetadata::builder("Invert")
///             .category(Category::ImageProcessing)
///             .inport(PortDefinition::inport("image.input", PortKind::RenderImage))
///             .outport(PortDefinition::outport("image.output", PortKind::RenderImage))
///             .build()
///     }
///
///     fn create(&self) -> Box<dyn Processor> {
///         Box::new(Invert)
///     }
///
///     fn process(&mut self, ctx: &mut ProcessContext) -> ProcessResult<()> {
///         let mut image = (*ctx.image("image.input")?).clone();
///         image.invert();
///         ctx.set_image("image.output", image)
///     }
/// }
/// ```
pub trait Processor {
    /// Metadata for this processor class. Must return consistent values.
    fn metadata(&self) -> ProcessorMetadata;

    /// Create a fresh, uninitialized instance of the same class.
    fn create(&self) -> Box<dyn Processor>;

    /// Acquire resources. Errors leave the processor in the Failed state.
    fn initialize(&mut self, _properties: &IndexMap<String, Property>) -> ProcessResult<()> {
        Ok(())
    }

    /// Release resources. Must tolerate being called after a failed
    /// initialization.
    fn deinitialize(&mut self) {}

    /// Compute outputs from the current inputs and properties.
    fn process(&mut self, ctx: &mut ProcessContext) -> ProcessResult<()>;

    /// Callable published on the coprocessor outport `port`, built from the
    /// current property values.
    fn coprocessor(
        &self,
        _port: &str,
        _properties: &IndexMap<String, Property>,
    ) -> Option<CoprocessorFn> {
        None
    }
}

/// Forwards its generic input to its output.
#[derive(Debug, Clone, Default)]
pub struct PassthroughProcessor;

impl Processor for PassthroughProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        ProcessorMetadata::builder("Passthrough")
            .category(Category::Utility)
            .description("Passes the input through unchanged")
            .inport(PortDefinition::inport("input", PortKind::Generic))
            .outport(PortDefinition::outport("output", PortKind::Generic))
            .build()
    }

    fn create(&self) -> Box<dyn Processor> {
        Box::new(PassthroughProcessor)
    }

    fn process(&mut self, ctx: &mut ProcessContext) -> ProcessResult<()> {
        let payload = ctx.input("input")?.clone();
        ctx.set_output("output", payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::port::{Payload, Port};
    use crate::core::types::Value;

    #[test]
    fn test_metadata_builder() {
        let metadata = ProcessorMetadata::builder("Blur")
            .category(Category::ImageProcessing)
            .description("Gaussian blur")
            .inport(PortDefinition::inport("image.input", PortKind::RenderImage))
            .outport(PortDefinition::outport("image.output", PortKind::RenderImage))
            .property(Property::float("sigma", "Sigma", 1.0, 0.0, 20.0))
            .tags(["filter", "smooth"])
            .build();

        assert_eq!(metadata.class_name, "Blur");
        assert!(metadata.inport("image.input").is_some());
        assert!(metadata.outport("image.input").is_none());
        assert!(metadata.property("sigma").is_some());
        assert!(metadata.matches("SMOOTH"));
        assert!(!metadata.end_processor);
    }

    #[test]
    fn test_passthrough_process() {
        let mut processor = PassthroughProcessor;
        let metadata = processor.metadata();

        let properties = IndexMap::new();
        let mut ports: IndexMap<String, Port> = metadata
            .outports
            .iter()
            .map(|d| (d.name.clone(), Port::new(d.clone())))
            .collect();
        let mut inputs = IndexMap::new();
        inputs.insert("input".to_string(), vec![Payload::Value(Value::Int(42))]);

        let mut ctx = ProcessContext::new("Passthrough", &properties, inputs, &mut ports);
        processor.process(&mut ctx).unwrap();

        let out = ports["output"].data.as_ref().and_then(|p| p.as_value());
        assert_eq!(out, Some(&Value::Int(42)));
    }

    #[test]
    fn test_invalidation_ordering() {
        assert!(InvalidationLevel::InvalidPorts > InvalidationLevel::InvalidResult);
        assert!(InvalidationLevel::InvalidResult > InvalidationLevel::Valid);
    }
}
