//! Image filters: Gaussian blur and unsharp masking.

use crate::core::context::ProcessContext;
use crate::core::error::ProcessResult;
use crate::core::port::{Payload, PortDefinition, PortKind};
use crate::core::processor::{Category, Processor, ProcessorMetadata, ProcessorMetadataBuilder};
use crate::core::property::Property;

const INPUT: &str = "image.input";
const OUTPUT: &str = "image.output";

fn image_ports(builder: ProcessorMetadataBuilder) -> ProcessorMetadataBuilder {
    builder
        .inport(PortDefinition::inport(INPUT, PortKind::RenderImage).with_description("Input image"))
        .outport(PortDefinition::outport(OUTPUT, PortKind::RenderImage).with_description("Filtered image"))
}

/// Applies a Gaussian blur.
#[derive(Debug, Clone, Default)]
pub struct Blur;

impl Processor for Blur {
    fn metadata(&self) -> ProcessorMetadata {
        image_ports(ProcessorMetadata::builder("Blur"))
            .category(Category::ImageProcessing)
            .description("Apply a Gaussian blur to an image")
            .property(Property::float("sigma", "Sigma", 1.0, 0.0, 20.0))
            .property(Property::bool("enabled", "Enabled", true))
            .tags(["filter", "smooth", "gaussian"])
            .build()
    }

    fn create(&self) -> Box<dyn Processor> {
        Box::new(Blur)
    }

    fn process(&mut self, ctx: &mut ProcessContext) -> ProcessResult<()> {
        let image = ctx.image(INPUT)?;
        let sigma = ctx.float("sigma")? as f32;

        if !ctx.bool("enabled")? || sigma <= 0.0 {
            return ctx.set_output(OUTPUT, Payload::Image(image));
        }
        ctx.set_image(OUTPUT, image.blur(sigma))
    }
}

/// Sharpens an image with an unsharp mask.
#[derive(Debug, Clone, Default)]
pub struct Sharpen;

impl Processor for Sharpen {
    fn metadata(&self) -> ProcessorMetadata {
        image_ports(ProcessorMetadata::builder("Sharpen"))
            .category(Category::ImageProcessing)
            .description("Sharpen an image with an unsharp mask")
            .property(Property::float("sigma", "Sigma", 1.0, 0.0, 20.0))
            .property(Property::int("threshold", "Threshold", 5, 0, 255))
            .tags(["filter", "unsharp"])
            .build()
    }

    fn create(&self) -> Box<dyn Processor> {
        Box::new(Sharpen)
    }

    fn process(&mut self, ctx: &mut ProcessContext) -> ProcessResult<()> {
        let image = ctx.image(INPUT)?;
        let sigma = ctx.float("sigma")? as f32;
        let threshold = ctx.int("threshold")? as i32;

        if sigma <= 0.0 {
            return ctx.set_output(OUTPUT, Payload::Image(image));
        }
        ctx.set_image(OUTPUT, image.unsharpen(sigma, threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ProcessError;
    use crate::core::port::Port;
    use crate::core::types::Value;
    use image::{DynamicImage, Rgba, RgbaImage};
    use indexmap::IndexMap;
    use std::sync::Arc;

    fn checker() -> Arc<DynamicImage> {
        let img = RgbaImage::from_fn(16, 16, |x, _| {
            if x < 8 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        Arc::new(DynamicImage::ImageRgba8(img))
    }

    fn run(
        processor: &mut dyn Processor,
        image: Option<Arc<DynamicImage>>,
        overrides: &[(&str, Value)],
    ) -> ProcessResult<DynamicImage> {
        let metadata = processor.metadata();
        let mut properties: IndexMap<String, Property> = metadata
            .properties
            .iter()
            .map(|p| (p.id().to_string(), p.clone()))
            .collect();
        for (name, value) in overrides {
            properties[*name].set(value.clone()).unwrap();
        }
        let mut ports: IndexMap<String, Port> = metadata
            .outports
            .iter()
            .map(|d| (d.name.clone(), Port::new(d.clone())))
            .collect();
        let mut inputs = IndexMap::new();
        if let Some(image) = image {
            inputs.insert(INPUT.to_string(), vec![Payload::Image(image)]);
        }
        let mut ctx = ProcessContext::new("filter", &properties, inputs, &mut ports);
        processor.process(&mut ctx)?;
        let out = ports[OUTPUT].data.as_ref().and_then(|p| p.as_image()).cloned();
        Ok((*out.unwrap()).clone())
    }

    #[test]
    fn test_blur_softens_edge() {
        let out = run(&mut Blur, Some(checker()), &[("sigma", Value::Float(2.0))]).unwrap();
        let edge = out.to_rgba8().get_pixel(7, 8)[0];
        assert!(edge > 0 && edge < 255);
    }

    #[test]
    fn test_disabled_blur_passes_through() {
        let input = checker();
        let out = run(&mut Blur, Some(input.clone()), &[("enabled", Value::Bool(false))]).unwrap();
        assert_eq!(out, *input);
    }

    #[test]
    fn test_sharpen_keeps_size() {
        let out = run(&mut Sharpen, Some(checker()), &[]).unwrap();
        assert_eq!((out.width(), out.height()), (16, 16));
    }

    #[test]
    fn test_missing_input() {
        let err = run(&mut Blur, None, &[]).unwrap_err();
        assert_eq!(err, ProcessError::MissingInput(INPUT.to_string()));
    }
}
