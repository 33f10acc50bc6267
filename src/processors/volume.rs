//! Volume to image projection.

use crate::core::context::ProcessContext;
use crate::core::error::{ProcessError, ProcessResult};
use crate::core::port::{PortDefinition, PortKind};
use crate::core::processor::{Category, Processor, ProcessorMetadata};
use image::{DynamicImage, GrayImage, Luma};

/// Maximum intensity projection along the z axis.
#[derive(Debug, Clone, Default)]
pub struct VolumeMip;

impl Processor for VolumeMip {
    fn metadata(&self) -> ProcessorMetadata {
        ProcessorMetadata::builder("VolumeMip")
            .category(Category::Volume)
            .description("Renders a maximum intensity projection of a volume")
            .inport(PortDefinition::inport("volume.input", PortKind::Volume))
            .outport(PortDefinition::outport("image.output", PortKind::RenderImage))
            .tags(["mip", "projection"])
            .build()
    }

    fn create(&self) -> Box<dyn Processor> {
        Box::new(VolumeMip)
    }

    fn process(&mut self, ctx: &mut ProcessContext) -> ProcessResult<()> {
        let payload = ctx.input("volume.input")?;
        let volume = payload
            .as_volume()
            .cloned()
            .ok_or_else(|| ProcessError::PayloadKind {
                port: "volume.input".to_string(),
                expected: PortKind::Volume,
                got: payload.kind(),
            })?;

        let [w, h, d] = volume.dimensions();
        let image = GrayImage::from_fn(w as u32, h as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            let max = (0..d)
                .filter_map(|z| volume.get(x, y, z))
                .fold(0.0f32, f32::max);
            Luma([(max.clamp(0.0, 1.0) * 255.0).round() as u8])
        });
        ctx.set_image("image.output", DynamicImage::ImageLuma8(image))
    }
}
