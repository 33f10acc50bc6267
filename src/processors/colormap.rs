//! Color mapping through a coprocessor port.
//!
//! `ColorMap` publishes a transfer function as a callable; `Colorize` calls
//! it to build a lookup table. The coprocessor edge does not take part in
//! evaluation ordering.

use crate::core::context::ProcessContext;
use crate::core::error::{ProcessError, ProcessResult};
use crate::core::port::{CoprocessorFn, PortDefinition, PortKind};
use crate::core::processor::{Category, Processor, ProcessorMetadata};
use crate::core::property::Property;
use crate::core::types::Value;
use image::{DynamicImage, Rgba, RgbaImage};
use indexmap::IndexMap;
use std::sync::Arc;

const COLORMAP_PORT: &str = "cp.colormap";

/// Publishes an intensity to RGBA mapping.
#[derive(Debug, Clone, Default)]
pub struct ColorMap;

impl Processor for ColorMap {
    fn metadata(&self) -> ProcessorMetadata {
        ProcessorMetadata::builder("ColorMap")
            .category(Category::Color)
            .description("Maps intensities in [0, 1] to colors")
            .outport(
                PortDefinition::outport(COLORMAP_PORT, PortKind::Coprocessor)
                    .with_description("Callable: float intensity to vec4 color"),
            )
            .property(Property::float("gamma", "Gamma", 1.0, 0.1, 5.0))
            .property(
                Property::new("tint", "Tint", Value::FloatVec3([1.0, 1.0, 1.0]))
                    .with_bounds(Value::FloatVec3([0.0; 3]), Value::FloatVec3([1.0; 3])),
            )
            .tags(["transfer function", "lut"])
            .build()
    }

    fn create(&self) -> Box<dyn Processor> {
        Box::new(ColorMap)
    }

    fn process(&mut self, _ctx: &mut ProcessContext) -> ProcessResult<()> {
        // The callable is republished before every pass
        Ok(())
    }

    fn coprocessor(
        &self,
        port: &str,
        properties: &IndexMap<String, Property>,
    ) -> Option<CoprocessorFn> {
        if port != COLORMAP_PORT {
            return None;
        }
        let gamma = properties.get("gamma")?.get().as_float()?;
        let tint = match properties.get("tint")?.get() {
            Value::FloatVec3(t) => *t,
            _ => return None,
        };

        Some(Arc::new(move |input: &Value| -> Result<Value, ProcessError> {
            let intensity = input
                .as_float()
                .ok_or_else(|| ProcessError::Coprocessor(format!("expected intensity, got {}", input.kind())))?
                .clamp(0.0, 1.0);
            let v = intensity.powf(1.0 / gamma);
            Ok(Value::FloatVec4([v * tint[0], v * tint[1], v * tint[2], 1.0]))
        }))
    }
}

/// Colors a grayscale version of its input through a bound color map.
#[derive(Debug, Clone, Default)]
pub struct Colorize;

impl Processor for Colorize {
    fn metadata(&self) -> ProcessorMetadata {
        ProcessorMetadata::builder("Colorize")
            .category(Category::Color)
            .description("Applies a color map to image intensities")
            .inport(PortDefinition::inport("image.input", PortKind::RenderImage))
            .inport(PortDefinition::inport(COLORMAP_PORT, PortKind::Coprocessor))
            .outport(PortDefinition::outport("image.output", PortKind::RenderImage))
            .build()
    }

    fn create(&self) -> Box<dyn Processor> {
        Box::new(Colorize)
    }

    fn process(&mut self, ctx: &mut ProcessContext) -> ProcessResult<()> {
        let image = ctx.image("image.input")?;
        let colormap = ctx.coprocessor(COLORMAP_PORT)?;

        let mut lut = Vec::with_capacity(256);
        for i in 0..256u32 {
            let color = colormap(&Value::Float(i as f64 / 255.0))?;
            let rgba = color
                .components()
                .filter(|c| c.len() == 4)
                .ok_or_else(|| ProcessError::Coprocessor(format!("expected vec4 color, got {}", color.kind())))?;
            let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
            lut.push(Rgba([byte(rgba[0]), byte(rgba[1]), byte(rgba[2]), byte(rgba[3])]));
        }

        let gray = image.to_luma8();
        let colored = RgbaImage::from_fn(gray.width(), gray.height(), |x, y| {
            lut[gray.get_pixel(x, y)[0] as usize]
        });
        ctx.set_image("image.output", DynamicImage::ImageRgba8(colored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(gamma: f64, tint: [f64; 3]) -> IndexMap<String, Property> {
        let mut props: IndexMap<String, Property> = ColorMap
            .metadata()
            .properties
            .into_iter()
            .map(|p| (p.id().to_string(), p))
            .collect();
        props["gamma"].set(Value::Float(gamma)).unwrap();
        props["tint"].set(Value::FloatVec3(tint)).unwrap();
        props
    }

    #[test]
    fn test_coprocessor_maps_intensity() {
        let f = ColorMap
            .coprocessor(COLORMAP_PORT, &properties(1.0, [1.0, 0.5, 0.0]))
            .unwrap();
        assert_eq!(f(&Value::Float(1.0)).unwrap(), Value::FloatVec4([1.0, 0.5, 0.0, 1.0]));
        assert_eq!(f(&Value::Float(-3.0)).unwrap(), Value::FloatVec4([0.0, 0.0, 0.0, 1.0]));
        assert!(f(&Value::String("x".into())).is_err());
    }

    #[test]
    fn test_unknown_port_has_no_callable() {
        assert!(ColorMap
            .coprocessor("image.output", &properties(1.0, [1.0; 3]))
            .is_none());
    }
}
