//! Process context.
//!
//! The context gives a processor access to its properties, the payloads
//! gathered from connected outports and its own outports during `process()`.

use crate::core::error::{ProcessError, ProcessResult};
use crate::core::port::{CoprocessorFn, Payload, Port, PortKind};
use crate::core::property::Property;
use crate::core::types::{Value, ValueKind};
use image::DynamicImage;
use indexmap::IndexMap;
use std::sync::Arc;

/// Context provided to [`Processor::process`](crate::core::processor::Processor::process).
pub struct ProcessContext<'a> {
    processor: &'a str,
    properties: &'a IndexMap<String, Property>,
    inputs: IndexMap<String, Vec<Payload>>,
    ports: &'a mut IndexMap<String, Port>,
    requests: Vec<(String, Value)>,
}

impl<'a> ProcessContext<'a> {
    /// Create a context. `inputs` maps inport names to the payloads of
    /// their connected outports, in connection order.
    pub fn new(
        processor: &'a str,
        properties: &'a IndexMap<String, Property>,
        inputs: IndexMap<String, Vec<Payload>>,
        ports: &'a mut IndexMap<String, Port>,
    ) -> Self {
        Self {
            processor,
            properties,
            inputs,
            ports,
            requests: Vec::new(),
        }
    }

    /// Name of the processor being run.
    pub fn processor_name(&self) -> &str {
        self.processor
    }

    // ========================================================================
    // Property Getters
    // ========================================================================

    /// Current value of a property.
    pub fn property(&self, name: &str) -> ProcessResult<&Value> {
        self.properties
            .get(name)
            .map(|p| p.get())
            .ok_or_else(|| ProcessError::UnknownProperty(name.to_string()))
    }

    fn typed<T>(
        &self,
        name: &str,
        expected: ValueKind,
        extract: impl FnOnce(&Value) -> Option<T>,
    ) -> ProcessResult<T> {
        extract(self.property(name)?).ok_or_else(|| ProcessError::WrongPropertyKind {
            property: name.to_string(),
            expected,
        })
    }

    pub fn float(&self, name: &str) -> ProcessResult<f64> {
        self.typed(name, ValueKind::Float, Value::as_float)
    }

    pub fn int(&self, name: &str) -> ProcessResult<i64> {
        self.typed(name, ValueKind::Int, Value::as_int)
    }

    pub fn bool(&self, name: &str) -> ProcessResult<bool> {
        self.typed(name, ValueKind::Bool, Value::as_bool)
    }

    /// Value of a string or option property.
    pub fn string(&self, name: &str) -> ProcessResult<&str> {
        let value = self.property(name)?;
        value.as_str().ok_or_else(|| ProcessError::WrongPropertyKind {
            property: name.to_string(),
            expected: ValueKind::String,
        })
    }

    pub fn int_vec2(&self, name: &str) -> ProcessResult<[i64; 2]> {
        self.typed(name, ValueKind::IntVec2, |v| match v {
            Value::IntVec2(c) => Some(*c),
            _ => None,
        })
    }

    pub fn int_vec4(&self, name: &str) -> ProcessResult<[i64; 4]> {
        self.typed(name, ValueKind::IntVec4, |v| match v {
            Value::IntVec4(c) => Some(*c),
            _ => None,
        })
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    /// Whether at least one payload arrived on the inport.
    pub fn has_input(&self, port: &str) -> bool {
        self.inputs.get(port).is_some_and(|p| !p.is_empty())
    }

    /// All payloads on an inport.
    pub fn inputs(&self, port: &str) -> &[Payload] {
        self.inputs.get(port).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First payload on an inport.
    pub fn input(&self, port: &str) -> ProcessResult<&Payload> {
        self.inputs(port)
            .first()
            .ok_or_else(|| ProcessError::MissingInput(port.to_string()))
    }

    /// Image on a render-image inport.
    pub fn image(&self, port: &str) -> ProcessResult<Arc<DynamicImage>> {
        let payload = self.input(port)?;
        payload
            .as_image()
            .cloned()
            .ok_or_else(|| ProcessError::PayloadKind {
                port: port.to_string(),
                expected: PortKind::RenderImage,
                got: payload.kind(),
            })
    }

    /// First callable bound to a coprocessor inport.
    pub fn coprocessor(&self, port: &str) -> ProcessResult<CoprocessorFn> {
        let payload = self.input(port)?;
        payload
            .as_coprocessor()
            .cloned()
            .ok_or_else(|| ProcessError::PayloadKind {
                port: port.to_string(),
                expected: PortKind::Coprocessor,
                got: payload.kind(),
            })
    }

    // ========================================================================
    // Outputs
    // ========================================================================

    /// Write a payload to one of this processor's outports.
    pub fn set_output(&mut self, port: &str, payload: Payload) -> ProcessResult<()> {
        match self.ports.get_mut(port) {
            Some(p) if p.definition.is_outport() => p.write(payload),
            _ => Err(ProcessError::UnknownPort(port.to_string())),
        }
    }

    pub fn set_image(&mut self, port: &str, image: DynamicImage) -> ProcessResult<()> {
        self.set_output(port, Payload::Image(Arc::new(image)))
    }

    /// Ask for a property write once `process()` returns. The write goes
    /// through link propagation like any other change.
    pub fn request_property(&mut self, name: impl Into<String>, value: Value) {
        self.requests.push((name.into(), value));
    }

    /// Consume the context, returning the deferred property writes.
    pub fn into_requests(self) -> Vec<(String, Value)> {
        self.requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::port::PortDefinition;
    use image::RgbaImage;

    fn fixture() -> (IndexMap<String, Property>, IndexMap<String, Port>) {
        let mut properties = IndexMap::new();
        properties.insert(
            "sigma".to_string(),
            Property::float("sigma", "Sigma", 2.0, 0.0, 20.0),
        );
        properties.insert(
            "mode".to_string(),
            Property::option("mode", "Mode", &[("a", "A")], "a"),
        );
        let mut ports = IndexMap::new();
        ports.insert(
            "image.output".to_string(),
            Port::new(PortDefinition::outport("image.output", PortKind::RenderImage)),
        );
        (properties, ports)
    }

    #[test]
    fn test_property_getters() {
        let (properties, mut ports) = fixture();
        let ctx = ProcessContext::new("Blur", &properties, IndexMap::new(), &mut ports);

        assert_eq!(ctx.float("sigma").unwrap(), 2.0);
        assert_eq!(ctx.string("mode").unwrap(), "a");
        assert!(matches!(
            ctx.int("sigma"),
            Err(ProcessError::WrongPropertyKind { .. })
        ));
        assert!(matches!(
            ctx.float("missing"),
            Err(ProcessError::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_missing_input() {
        let (properties, mut ports) = fixture();
        let ctx = ProcessContext::new("Blur", &properties, IndexMap::new(), &mut ports);
        assert!(!ctx.has_input("image.input"));
        assert!(matches!(
            ctx.image("image.input"),
            Err(ProcessError::MissingInput(_))
        ));
    }

    #[test]
    fn test_set_output_and_requests() {
        let (properties, mut ports) = fixture();
        let mut ctx = ProcessContext::new("Blur", &properties, IndexMap::new(), &mut ports);

        let image = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
        ctx.set_image("image.output", image).unwrap();
        assert!(matches!(
            ctx.set_output("nope", Payload::Value(Value::Int(1))),
            Err(ProcessError::UnknownPort(_))
        ));
        assert!(matches!(
            ctx.set_output("image.output", Payload::Value(Value::Int(1))),
            Err(ProcessError::PayloadKind { .. })
        ));

        ctx.request_property("sigma", Value::Float(3.0));
        let requests = ctx.into_requests();
        assert_eq!(requests, vec![("sigma".to_string(), Value::Float(3.0))]);
        assert!(ports["image.output"].has_data());
    }
}
