//! Port definitions and payloads for processor inputs/outputs.
//!
//! Ports define the data interface of a processor. Each port has a kind tag;
//! connections are only allowed between ports with equal tags.

use crate::core::error::ProcessError;
use crate::core::types::Value;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Direction of a port (input or output).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    /// Name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            PortDirection::Input => "inport",
            PortDirection::Output => "outport",
        }
    }
}

/// Kind tag of a port.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    /// 2D rendered image
    RenderImage,
    /// Volume dataset handle
    Volume,
    /// Callable reference published by the producing processor
    Coprocessor,
    /// Any property value
    Generic,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PortKind::RenderImage => "render image",
            PortKind::Volume => "volume",
            PortKind::Coprocessor => "coprocessor",
            PortKind::Generic => "generic",
        };
        write!(f, "{}", name)
    }
}

/// Definition of a processor port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortDefinition {
    /// Identifier, unique within the processor
    pub name: String,
    /// Kind of data this port carries
    pub kind: PortKind,
    /// Direction (input or output)
    pub direction: PortDirection,
    /// Processor may run with this inport unconnected
    pub optional: bool,
    /// Inport accepts more than one connection
    pub multiple: bool,
    /// Inport reads the previous pass's data. Exempt from acyclicity.
    pub feedback: bool,
    /// Description for documentation and tooltips
    pub description: String,
}

impl PortDefinition {
    fn new(name: impl Into<String>, kind: PortKind, direction: PortDirection) -> Self {
        Self {
            name: name.into(),
            kind,
            direction,
            optional: false,
            // Coprocessor inports may bind several producers
            multiple: direction == PortDirection::Input && kind == PortKind::Coprocessor,
            feedback: false,
            description: String::new(),
        }
    }

    /// Create an inport definition.
    pub fn inport(name: impl Into<String>, kind: PortKind) -> Self {
        Self::new(name, kind, PortDirection::Input)
    }

    /// Create an outport definition.
    pub fn outport(name: impl Into<String>, kind: PortKind) -> Self {
        Self::new(name, kind, PortDirection::Output)
    }

    /// Mark the inport as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Allow more than one incoming connection.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Mark the inport as a feedback port.
    pub fn feedback(mut self) -> Self {
        self.feedback = true;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_inport(&self) -> bool {
        self.direction == PortDirection::Input
    }

    pub fn is_outport(&self) -> bool {
        self.direction == PortDirection::Output
    }

    /// Whether an edge ending at this port is ignored by ordering.
    pub fn is_exempt(&self) -> bool {
        self.kind == PortKind::Coprocessor || self.feedback
    }

    /// Maximum number of incoming connections, `None` for unbounded.
    pub fn capacity(&self) -> Option<usize> {
        match self.direction {
            PortDirection::Output => None,
            PortDirection::Input if self.multiple => None,
            PortDirection::Input => Some(1),
        }
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Callable published on a coprocessor outport.
pub type CoprocessorFn = Arc<dyn Fn(&Value) -> Result<Value, ProcessError>>;

/// Minimal volume handle: dimensions plus voxel intensities.
///
/// Volume decoding lives outside the core; this is the in-memory shape
/// passed between processors. The voxel count always matches the
/// dimensions, x varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    dimensions: [usize; 3],
    voxels: Vec<f32>,
}

impl Volume {
    /// Create a zero-filled volume.
    pub fn new(dimensions: [usize; 3]) -> Self {
        let len = dimensions.iter().product();
        Self {
            dimensions,
            voxels: vec![0.0; len],
        }
    }

    /// Wrap existing voxel data. Fails if the length does not match.
    pub fn from_voxels(dimensions: [usize; 3], voxels: Vec<f32>) -> Result<Self, ProcessError> {
        let expected = dimensions
            .iter()
            .try_fold(1usize, |acc, d| acc.checked_mul(*d));
        if expected != Some(voxels.len()) {
            return Err(ProcessError::Failed(format!(
                "volume of {}x{}x{} needs {} voxels, got {}",
                dimensions[0],
                dimensions[1],
                dimensions[2],
                expected.map_or_else(|| "too many".to_string(), |n| n.to_string()),
                voxels.len()
            )));
        }
        Ok(Self { dimensions, voxels })
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    pub fn voxels(&self) -> &[f32] {
        &self.voxels
    }

    /// Intensity at `(x, y, z)`, or `None` outside the volume.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        let [w, h, d] = self.dimensions;
        if x >= w || y >= h || z >= d {
            return None;
        }
        self.voxels.get(x + w * (y + h * z)).copied()
    }

    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }
}

/// Data held by a port.
///
/// Consumers receive clones of the `Arc` handles; the data stays valid
/// until the producer writes its next result.
#[derive(Clone)]
pub enum Payload {
    Image(Arc<DynamicImage>),
    Volume(Arc<Volume>),
    Coprocessor(CoprocessorFn),
    Value(Value),
}

impl Payload {
    /// Port kind that may carry this payload.
    pub fn kind(&self) -> PortKind {
        match self {
            Payload::Image(_) => PortKind::RenderImage,
            Payload::Volume(_) => PortKind::Volume,
            Payload::Coprocessor(_) => PortKind::Coprocessor,
            Payload::Value(_) => PortKind::Generic,
        }
    }

    pub fn as_image(&self) -> Option<&Arc<DynamicImage>> {
        if let Payload::Image(img) = self {
            Some(img)
        } else {
            None
        }
    }

    pub fn as_volume(&self) -> Option<&Arc<Volume>> {
        if let Payload::Volume(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_coprocessor(&self) -> Option<&CoprocessorFn> {
        if let Payload::Coprocessor(f) = self {
            Some(f)
        } else {
            None
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        if let Payload::Value(v) = self {
            Some(v)
        } else {
            None
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Image(img) => f
                .debug_struct("Image")
                .field("width", &img.width())
                .field("height", &img.height())
                .finish(),
            Payload::Volume(v) => f
                .debug_struct("Volume")
                .field("dimensions", &v.dimensions())
                .finish(),
            Payload::Coprocessor(_) => write!(f, "Coprocessor(<callable>)"),
            Payload::Value(v) => f.debug_tuple("Value").field(v).finish(),
        }
    }
}

/// A port instance on a processor node.
#[derive(Debug, Clone)]
pub struct Port {
    pub definition: PortDefinition,
    /// Current data. Only outports hold data.
    pub data: Option<Payload>,
}

impl Port {
    pub fn new(definition: PortDefinition) -> Self {
        Self {
            definition,
            data: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn kind(&self) -> PortKind {
        self.definition.kind
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Store a payload, checking it against the port kind.
    pub fn write(&mut self, payload: Payload) -> Result<(), ProcessError> {
        if payload.kind() != self.kind() {
            return Err(ProcessError::PayloadKind {
                port: self.definition.name.clone(),
                expected: self.kind(),
                got: payload.kind(),
            });
        }
        self.data = Some(payload);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.data = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_definition_builder() {
        let port = PortDefinition::inport("image.input", PortKind::RenderImage)
            .optional()
            .with_description("Input image");

        assert!(port.is_inport());
        assert!(port.optional);
        assert!(!port.multiple);
        assert_eq!(port.capacity(), Some(1));
        assert!(!port.is_exempt());
    }

    #[test]
    fn test_coprocessor_inport_defaults() {
        let port = PortDefinition::inport("cp.in", PortKind::Coprocessor);
        assert!(port.multiple);
        assert!(port.is_exempt());
        assert_eq!(port.capacity(), None);

        let out = PortDefinition::outport("cp.out", PortKind::Coprocessor);
        assert!(!out.multiple);
    }

    #[test]
    fn test_feedback_is_exempt() {
        let port = PortDefinition::inport("loop", PortKind::Generic).feedback();
        assert!(port.is_exempt());
    }

    #[test]
    fn test_port_write_checks_kind() {
        let mut port = Port::new(PortDefinition::outport("out", PortKind::Generic));
        assert!(port.write(Payload::Value(Value::Int(3))).is_ok());
        assert!(port.has_data());

        let err = port
            .write(Payload::Volume(Arc::new(Volume::new([2, 2, 2]))))
            .unwrap_err();
        assert!(matches!(err, ProcessError::PayloadKind { .. }));
        // Old data stays
        assert_eq!(
            port.data.as_ref().and_then(|p| p.as_value()),
            Some(&Value::Int(3))
        );
    }

    #[test]
    fn test_volume_new() {
        let v = Volume::new([2, 3, 4]);
        assert_eq!(v.voxel_count(), 24);
        assert_eq!(v.get(1, 2, 3), Some(0.0));
        assert_eq!(v.get(2, 0, 0), None);
    }

    #[test]
    fn test_volume_rejects_mismatched_voxels() {
        assert!(Volume::from_voxels([4, 4, 4], vec![0.0; 8]).is_err());
        assert!(Volume::from_voxels([usize::MAX, 2, 1], Vec::new()).is_err());

        let v = Volume::from_voxels([2, 1, 2], vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(v.get(1, 0, 1), Some(0.4));
    }
}
